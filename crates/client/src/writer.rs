//! Event writer
//!
//! [`Writer`] ties the pieces together: domain masks, the rate controller,
//! record building, and the transport. Its `write*` methods return the
//! integer codes from [`ret_code`](crate::ret_code); [`Writer::try_write`]
//! keeps the typed error for Rust callers.

use std::collections::HashSet;

use chrono::Utc;
use nix::unistd;
use once_cell::sync::OnceCell;
use sysevent_config::Config;
use sysevent_protocol::{
    EncodedParam, EventType, MAX_ARRAY_SIZE, MAX_DOMAIN_LENGTH, MAX_EVENT_NAME_LENGTH,
    MAX_PARAM_NAME_LENGTH, MAX_PARAM_NUMBER, MAX_STRING_LENGTH, ParamValue, RecordBuilder,
    is_valid_name, local_time_zone,
};

use crate::controller::{CallSite, ControlParam, RateController};
use crate::error::WriteError;
use crate::ret_code::{self, SUCCESS};
use crate::trace;
use crate::transport::Transport;

#[cfg(test)]
#[path = "writer_test.rs"]
mod tests;

static GLOBAL: OnceCell<Writer> = OnceCell::new();

/// Process-wide write context
pub struct Writer {
    controller: RateController,
    transport: Transport,
    masked_domains: HashSet<String>,
}

impl Writer {
    pub fn new(config: &Config) -> Self {
        Self {
            controller: RateController::from_config(&config.rate_limit),
            transport: Transport::from_config(&config.transport),
            masked_domains: config.masked_domains.iter().cloned().collect(),
        }
    }

    /// The process-wide writer, built from defaults on first use
    pub fn global() -> &'static Writer {
        GLOBAL.get_or_init(|| Writer::new(&Config::default()))
    }

    /// Install the process-wide writer
    ///
    /// Returns false if [`Writer::global`] was already initialized, in which
    /// case the existing writer stays in place.
    pub fn init_global(config: &Config) -> bool {
        let installed = GLOBAL.set(Writer::new(config)).is_ok();
        if !installed {
            tracing::warn!("global writer already initialized, keeping existing configuration");
        }
        installed
    }

    /// Write an event with the default rate limit
    pub fn write<I>(
        &self,
        caller: &CallSite<'_>,
        domain: &str,
        name: &str,
        event_type: EventType,
        params: I,
    ) -> i32
    where
        I: IntoIterator<Item = EncodedParam>,
    {
        self.write_with_control(None, caller, domain, name, event_type, params)
    }

    /// Write an event, optionally overriding the rate limit for this call site
    pub fn write_with_control<I>(
        &self,
        control: Option<ControlParam>,
        caller: &CallSite<'_>,
        domain: &str,
        name: &str,
        event_type: EventType,
        params: I,
    ) -> i32
    where
        I: IntoIterator<Item = EncodedParam>,
    {
        match self.try_write(control, caller, domain, name, event_type, params) {
            Ok(code) => {
                if ret_code::is_warning(code) {
                    tracing::warn!(
                        domain = %domain,
                        event = %name,
                        code,
                        reason = ret_code::explain(code),
                        "event written with degraded parameters"
                    );
                }
                code
            }
            Err(e) if e.is_expected_drop() => {
                tracing::debug!(domain = %domain, event = %name, code = e.code(), "event dropped: {e}");
                e.code()
            }
            Err(e) => {
                tracing::error!(domain = %domain, event = %name, code = e.code(), "event write failed: {e}");
                e.code()
            }
        }
    }

    /// Write an event and return the typed outcome
    ///
    /// `Ok` carries [`SUCCESS`] or the first parameter warning.
    ///
    /// # Errors
    ///
    /// Any condition that stops the event from being sent: a masked domain,
    /// rate suppression, invalid names, encoding failure, or transport
    /// failure.
    pub fn try_write<I>(
        &self,
        control: Option<ControlParam>,
        caller: &CallSite<'_>,
        domain: &str,
        name: &str,
        event_type: EventType,
        params: I,
    ) -> Result<i32, WriteError>
    where
        I: IntoIterator<Item = EncodedParam>,
    {
        if self.masked_domains.contains(domain) {
            return Err(WriteError::DomainMasked(domain.to_string()));
        }

        if !self.controller.check(control, domain, name, caller).is_admitted() {
            return Err(WriteError::RateLimited {
                domain: domain.to_string(),
                name: name.to_string(),
            });
        }

        if !is_valid_name(domain, MAX_DOMAIN_LENGTH) {
            return Err(WriteError::InvalidDomain(domain.to_string()));
        }
        if !is_valid_name(name, MAX_EVENT_NAME_LENGTH) {
            return Err(WriteError::InvalidEventName(name.to_string()));
        }

        let mut builder =
            RecordBuilder::with_limit(domain, name, event_type, self.transport.max_data_size());
        fill_header(&mut builder);

        let code = append_params(&mut builder, params);
        let record = builder.build()?;
        self.transport.send_data(&record)?;

        tracing::debug!(
            domain = %domain,
            event = %name,
            size = record.len(),
            params = builder.param_count(),
            "event sent"
        );
        Ok(code)
    }

    pub fn controller(&self) -> &RateController {
        &self.controller
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn is_domain_masked(&self, domain: &str) -> bool {
        self.masked_domains.contains(domain)
    }
}

/// Stamp time, process identity, and the ambient trace
fn fill_header(builder: &mut RecordBuilder) {
    let timestamp = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    builder
        .timestamp(timestamp)
        .time_zone(&local_time_zone())
        .uid(unistd::getuid().as_raw())
        .pid(raw_id(unistd::getpid().as_raw()))
        .tid(current_tid());

    if let Some(info) = trace::current() {
        builder.trace_info(info);
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn current_tid() -> u32 {
    raw_id(unistd::gettid().as_raw())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn current_tid() -> u32 {
    raw_id(unistd::getpid().as_raw())
}

fn raw_id(id: i32) -> u32 {
    u32::try_from(id).unwrap_or(0)
}

/// Check, trim, and append each parameter
///
/// Returns [`SUCCESS`] or the first warning raised. Parameters that cannot be
/// repaired are dropped; the rest of the event is still written.
fn append_params<I>(builder: &mut RecordBuilder, params: I) -> i32
where
    I: IntoIterator<Item = EncodedParam>,
{
    let mut code = SUCCESS;

    for mut param in params {
        if !is_valid_name(param.key(), MAX_PARAM_NAME_LENGTH) {
            tracing::debug!(key = %param.key(), "invalid parameter key, dropped");
            code = ret_code::fold(code, ret_code::ERR_KEY_NAME_INVALID);
            continue;
        }

        if builder.param_count() >= MAX_PARAM_NUMBER && builder.get_value(param.key()).is_none() {
            tracing::debug!(key = %param.key(), max = MAX_PARAM_NUMBER, "too many parameters, dropped");
            code = ret_code::fold(code, ret_code::ERR_KEY_NUMBER_TOO_MUCH);
            continue;
        }

        if param.value_mut().truncate_strings(MAX_STRING_LENGTH) {
            tracing::debug!(key = %param.key(), max = MAX_STRING_LENGTH, "string value truncated");
            code = ret_code::fold(code, ret_code::ERR_VALUE_LENGTH_TOO_LONG);
        }

        if param.value_mut().truncate_array(MAX_ARRAY_SIZE) {
            tracing::debug!(key = %param.key(), max = MAX_ARRAY_SIZE, "array truncated");
            code = ret_code::fold(code, ret_code::ERR_ARRAY_TOO_MUCH);
        }

        if param.value().array_len() == Some(0) {
            let (key, _) = param.into_parts();
            param = EncodedParam::new(key, ParamValue::BoolArray(Vec::new()));
        }

        if let Err(e) = builder.append_value(param) {
            tracing::debug!(error = %e, "parameter could not be encoded, dropped");
            code = ret_code::fold(code, ret_code::ERR_ENCODE_VALUE_FAILED);
        }
    }

    code
}
