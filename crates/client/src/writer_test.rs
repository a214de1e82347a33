//! Tests for Writer

use std::os::unix::net::UnixDatagram;
use std::time::Duration;

use sysevent_config::{Config, RateLimitConfig, TransportConfig};
use sysevent_protocol::{DecodedRecord, TraceInfo, decode_record};
use tempfile::TempDir;

use super::*;

struct Harness {
    dir: TempDir,
    writer: Writer,
    receiver: UnixDatagram,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(Config::default())
    }

    fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().unwrap();
        config.transport = TransportConfig {
            socket_path: dir.path().join("normal"),
            priority_socket_path: dir.path().join("fast"),
            ..config.transport
        };

        let receiver = UnixDatagram::bind(&config.transport.socket_path).unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();

        Self {
            dir,
            writer: Writer::new(&config),
            receiver,
        }
    }

    fn recv(&self) -> Option<DecodedRecord> {
        let mut buf = vec![0u8; 64 * 1024];
        let n = self.receiver.recv(&mut buf).ok()?;
        Some(decode_record(&buf[..n]).unwrap())
    }
}

fn site(line: u32) -> CallSite<'static> {
    CallSite::new("sysevent_client::writer_test", line)
}

fn no_params() -> Vec<EncodedParam> {
    Vec::new()
}

fn builder() -> RecordBuilder {
    RecordBuilder::new("DOMAIN", "EVENT", EventType::Statistic)
}

// =============================================================================
// Write path tests
// =============================================================================

#[test]
fn test_power_key_event_reaches_socket() {
    let harness = Harness::new();

    let code = harness.writer.write(
        &site(1),
        "KERNEL_VENDOR",
        "POWER_KEY",
        EventType::Fault,
        [EncodedParam::new("k", 18u64)],
    );
    assert_eq!(code, ret_code::SUCCESS);

    let record = harness.recv().unwrap();
    assert_eq!(record.header.domain, "KERNEL_VENDOR");
    assert_eq!(record.header.name, "POWER_KEY");
    assert_eq!(record.header.event_type, EventType::Fault);
    assert_eq!(record.header.pid, std::process::id());
    assert!(record.header.timestamp > 0);
    assert!(record.trace_info.is_none());
    assert_eq!(record.params.len(), 1);
    assert_eq!(record.get("k").and_then(|p| p.as_u64()), Some(18));
}

#[test]
fn test_rate_limit_after_threshold() {
    let mut config = Config::default();
    config.rate_limit = RateLimitConfig {
        period: 5,
        threshold: 10,
        ..RateLimitConfig::default()
    };
    let harness = Harness::with_config(config);

    let codes: Vec<i32> = (0..15)
        .map(|_| {
            harness
                .writer
                .write(&site(7), "DOMAIN", "BURST", EventType::Behavior, no_params())
        })
        .collect();

    assert!(codes[..10].iter().all(|&c| c == ret_code::SUCCESS));
    assert!(
        codes[10..]
            .iter()
            .all(|&c| c == ret_code::ERR_WRITE_IN_HIGH_FREQ)
    );
    assert_eq!(harness.writer.controller().stats().suppressed(), 5);
}

#[test]
fn test_control_param_overrides_default() {
    let harness = Harness::new();
    let control = Some(ControlParam::new(60, 1));

    let first = harness.writer.write_with_control(
        control,
        &site(3),
        "DOMAIN",
        "EVENT",
        EventType::Fault,
        no_params(),
    );
    let second = harness.writer.write_with_control(
        control,
        &site(3),
        "DOMAIN",
        "EVENT",
        EventType::Fault,
        no_params(),
    );

    assert_eq!(first, ret_code::SUCCESS);
    assert_eq!(second, ret_code::ERR_WRITE_IN_HIGH_FREQ);
}

#[test]
fn test_masked_domain_sends_nothing() {
    let mut config = Config::default();
    config.masked_domains = vec!["QUIET".to_string()];
    let harness = Harness::with_config(config);

    let code = harness
        .writer
        .write(&site(1), "QUIET", "EVENT", EventType::Fault, no_params());

    assert_eq!(code, ret_code::ERR_DOMAIN_MASKED);
    assert!(harness.recv().is_none());
    assert_eq!(harness.writer.controller().tracked(), 0);
}

#[test]
fn test_pipe_separated_masks() {
    let mut config = Config::default();
    config.masked_domains = sysevent_config::parse_domain_masks("QUIET|HUSH");
    let harness = Harness::with_config(config);

    for domain in ["QUIET", "HUSH"] {
        assert!(harness.writer.is_domain_masked(domain));
        let code = harness
            .writer
            .write(&site(1), domain, "EVENT", EventType::Fault, no_params());
        assert_eq!(code, ret_code::ERR_DOMAIN_MASKED);
    }
    assert!(!harness.writer.is_domain_masked("LOUD"));
    assert!(harness.recv().is_none());
}

#[test]
fn test_invalid_names_are_fatal() {
    let harness = Harness::new();

    let code = harness
        .writer
        .write(&site(1), "1DOMAIN", "EVENT", EventType::Fault, no_params());
    assert_eq!(code, ret_code::ERR_DOMAIN_NAME_INVALID);

    let code = harness.writer.write(
        &site(2),
        "DOMAIN",
        "A_VERY_LONG_EVENT_NAME_PAST_THE_LIMIT",
        EventType::Fault,
        no_params(),
    );
    assert_eq!(code, ret_code::ERR_EVENT_NAME_INVALID);

    assert!(harness.recv().is_none());
}

#[test]
fn test_warning_still_sends_event() {
    let harness = Harness::new();

    let code = harness.writer.write(
        &site(1),
        "DOMAIN",
        "EVENT",
        EventType::Security,
        [
            EncodedParam::new("bad key", 1i32),
            EncodedParam::new("GOOD", "value"),
        ],
    );
    assert_eq!(code, ret_code::ERR_KEY_NAME_INVALID);

    let record = harness.recv().unwrap();
    assert_eq!(record.params.len(), 1);
    assert_eq!(record.get("GOOD").and_then(|p| p.as_string()), Some("value".into()));
}

#[test]
fn test_trace_context_is_embedded() {
    let harness = Harness::new();
    let info = TraceInfo::new(0xABCD, 7, 3, 1);

    let _guard = trace::scope(info);
    let code = harness
        .writer
        .write(&site(1), "DOMAIN", "TRACED", EventType::Behavior, no_params());
    assert_eq!(code, ret_code::SUCCESS);

    let record = harness.recv().unwrap();
    assert!(record.header.is_trace_opened);
    assert_eq!(record.trace_info, Some(info));
}

#[test]
fn test_send_failure_overrides_warning() {
    let harness = Harness::new();
    let mut config = Config::default();
    config.transport.socket_path = harness.dir.path().join("missing");
    let writer = Writer::new(&config);

    let code = writer.write(
        &site(1),
        "DOMAIN",
        "EVENT",
        EventType::Fault,
        [EncodedParam::new("", 1i32)],
    );

    assert_eq!(code, ret_code::ERR_SEND_FAIL);
    assert_eq!(writer.transport().queued(), 1);
}

#[test]
fn test_try_write_returns_typed_error() {
    let mut config = Config::default();
    config.masked_domains = vec!["QUIET".to_string()];
    let harness = Harness::with_config(config);

    let err = harness
        .writer
        .try_write(None, &site(1), "QUIET", "EVENT", EventType::Fault, no_params())
        .unwrap_err();
    assert!(matches!(err, WriteError::DomainMasked(ref d) if d == "QUIET"));
    assert!(harness.writer.is_domain_masked("QUIET"));
}

// =============================================================================
// Parameter checks
// =============================================================================

#[test]
fn test_too_many_params() {
    let mut builder = builder();
    let params = (0..MAX_PARAM_NUMBER + 5).map(|i| EncodedParam::new(format!("K{i}"), i as u32));

    let code = append_params(&mut builder, params);

    assert_eq!(code, ret_code::ERR_KEY_NUMBER_TOO_MUCH);
    assert_eq!(builder.param_count(), MAX_PARAM_NUMBER);
}

#[test]
fn test_duplicate_key_at_limit_replaces() {
    let mut builder = builder();
    let params = (0..MAX_PARAM_NUMBER).map(|i| EncodedParam::new(format!("K{i}"), i as u32));
    assert_eq!(append_params(&mut builder, params), ret_code::SUCCESS);

    let code = append_params(&mut builder, [EncodedParam::new("K0", 99u32)]);

    assert_eq!(code, ret_code::SUCCESS);
    assert_eq!(builder.param_count(), MAX_PARAM_NUMBER);
    assert_eq!(builder.get_value("K0").and_then(|p| p.as_u64()), Some(99));
}

#[test]
fn test_long_string_truncated() {
    let mut builder = builder();
    let long = "x".repeat(MAX_STRING_LENGTH + 10);

    let code = append_params(&mut builder, [EncodedParam::new("TEXT", long)]);

    assert_eq!(code, ret_code::ERR_VALUE_LENGTH_TOO_LONG);
    let kept = builder.get_value("TEXT").and_then(|p| p.as_string()).unwrap();
    assert_eq!(kept.len(), MAX_STRING_LENGTH);
}

#[test]
fn test_long_array_truncated() {
    let mut builder = builder();
    let values: Vec<i64> = (0..150).collect();

    let code = append_params(&mut builder, [EncodedParam::new("ARR", values)]);

    assert_eq!(code, ret_code::ERR_ARRAY_TOO_MUCH);
    let kept = builder.get_value("ARR").and_then(|p| p.as_i64_vec()).unwrap();
    assert_eq!(kept.len(), MAX_ARRAY_SIZE);
    assert_eq!(kept.last(), Some(&99));
}

#[test]
fn test_empty_array_becomes_bool_array() {
    let mut builder = builder();

    let code = append_params(&mut builder, [EncodedParam::new("EMPTY", Vec::<String>::new())]);

    assert_eq!(code, ret_code::SUCCESS);
    let param = builder.get_value("EMPTY").unwrap();
    assert_eq!(param.value(), &ParamValue::BoolArray(Vec::new()));
}

#[test]
fn test_first_warning_wins() {
    let mut builder = builder();
    let params = [
        EncodedParam::new("ARR", vec![0u8; MAX_ARRAY_SIZE + 1]),
        EncodedParam::new("not valid", 1i32),
    ];

    let code = append_params(&mut builder, params);

    assert_eq!(code, ret_code::ERR_ARRAY_TOO_MUCH);
    assert_eq!(builder.param_count(), 1);
}

#[test]
fn test_oversized_param_dropped() {
    let mut builder = RecordBuilder::with_limit("DOMAIN", "EVENT", EventType::Fault, 200);

    let code = append_params(
        &mut builder,
        [
            EncodedParam::new("SMALL", 1u8),
            EncodedParam::new("BIG", "y".repeat(500)),
        ],
    );

    assert_eq!(code, ret_code::ERR_ENCODE_VALUE_FAILED);
    assert_eq!(builder.param_count(), 1);
    assert!(builder.get_value("SMALL").is_some());
}
