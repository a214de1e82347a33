//! Write-rate limiting configuration
//!
//! Defaults can be baked in at build time through the `SYSEVENT_PERIOD` and
//! `SYSEVENT_THRESHOLD` environment variables; unset, empty, zero, or
//! non-numeric values fall back to 5 seconds and 100 writes.

use serde::Deserialize;

/// Window length in seconds
pub const DEFAULT_PERIOD: u32 = parse_or(option_env!("SYSEVENT_PERIOD"), 5);

/// Writes admitted per window per call site
pub const DEFAULT_THRESHOLD: u32 = parse_or(option_env!("SYSEVENT_THRESHOLD"), 100);

/// Number of call sites tracked before the least recent is evicted
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Parse a positive decimal `u32` at compile time
const fn parse_or(value: Option<&str>, default: u32) -> u32 {
    let Some(text) = value else {
        return default;
    };
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return default;
    }

    let mut acc: u64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !b.is_ascii_digit() {
            return default;
        }
        acc = acc * 10 + (b - b'0') as u64;
        if acc > u32::MAX as u64 {
            return default;
        }
        i += 1;
    }

    if acc == 0 { default } else { acc as u32 }
}

/// Rate limiting configuration
///
/// # Example
///
/// ```toml
/// [rate_limit]
/// period = 5
/// threshold = 100
/// cache_capacity = 100
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Set to false to admit every write
    pub enabled: bool,

    /// Window length in seconds
    pub period: u32,

    /// Writes admitted per window
    pub threshold: u32,

    /// Tracked call sites
    pub cache_capacity: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: DEFAULT_PERIOD,
            threshold: DEFAULT_THRESHOLD,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or(None, 5), 5);
        assert_eq!(parse_or(Some(""), 5), 5);
        assert_eq!(parse_or(Some("10"), 5), 10);
        assert_eq!(parse_or(Some("0"), 5), 5);
        assert_eq!(parse_or(Some("-3"), 5), 5);
        assert_eq!(parse_or(Some("1x"), 5), 5);
        assert_eq!(parse_or(Some("4294967295"), 5), u32::MAX);
        assert_eq!(parse_or(Some("4294967296"), 5), 5);
    }

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.period, DEFAULT_PERIOD);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.cache_capacity, 100);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RateLimitConfig = toml::from_str("threshold = 10").unwrap();
        assert_eq!(config.threshold, 10);
        assert_eq!(config.period, DEFAULT_PERIOD);
    }
}
