//! Configuration validation
//!
//! Rejects settings the client cannot run with:
//! - Zero-length rate windows or thresholds
//! - Zero send attempts
//! - Record limits too small for a header or above the wire maximum
//! - Masked domains that could never match a valid write

use sysevent_protocol::{
    HEADER_SIZE, LENGTH_PREFIX_SIZE, MAX_DATA_SIZE, MAX_DOMAIN_LENGTH, PARAM_COUNT_SIZE,
    is_valid_name,
};

use crate::Config;
use crate::error::{ConfigError, Result};

/// Smallest record the transport must accept: prefix, header, param count
const MIN_DATA_SIZE: usize = LENGTH_PREFIX_SIZE + HEADER_SIZE + PARAM_COUNT_SIZE;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_rate_limit(config)?;
    validate_transport(config)?;
    validate_masked_domains(config)?;
    Ok(())
}

fn validate_rate_limit(config: &Config) -> Result<()> {
    let rate = &config.rate_limit;
    if rate.period == 0 {
        return Err(ConfigError::invalid_value("rate_limit", "period", "must be at least 1 second"));
    }
    if rate.threshold == 0 {
        return Err(ConfigError::invalid_value("rate_limit", "threshold", "must be at least 1"));
    }
    if rate.cache_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "rate_limit",
            "cache_capacity",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_transport(config: &Config) -> Result<()> {
    let transport = &config.transport;
    if transport.retry_times == 0 {
        return Err(ConfigError::invalid_value("transport", "retry_times", "must be at least 1"));
    }
    if !(MIN_DATA_SIZE..=MAX_DATA_SIZE).contains(&transport.max_data_size) {
        return Err(ConfigError::invalid_value(
            "transport",
            "max_data_size",
            format!("must be between {MIN_DATA_SIZE} and {MAX_DATA_SIZE}"),
        ));
    }
    if transport.socket_path.as_os_str().is_empty() {
        return Err(ConfigError::invalid_value("transport", "socket_path", "must not be empty"));
    }
    if transport.priority_socket_path.as_os_str().is_empty() {
        return Err(ConfigError::invalid_value(
            "transport",
            "priority_socket_path",
            "must not be empty",
        ));
    }
    Ok(())
}

fn validate_masked_domains(config: &Config) -> Result<()> {
    match config
        .masked_domains
        .iter()
        .find(|d| !is_valid_name(d, MAX_DOMAIN_LENGTH))
    {
        Some(bad) => Err(ConfigError::invalid_masked_domain(bad.as_str())),
        None => Ok(()),
    }
}
