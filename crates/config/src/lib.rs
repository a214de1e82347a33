//! SysEvent Configuration
//!
//! TOML-based configuration for the system event client. Every section is
//! optional; an empty file gives the built-in defaults.
//!
//! # Parsing
//!
//! ```
//! use std::str::FromStr;
//! use sysevent_config::Config;
//!
//! let config = Config::from_str("[rate_limit]\nthreshold = 10").unwrap();
//! assert_eq!(config.rate_limit.threshold, 10);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! masked_domains = ["DEBUG_DOMAIN"]
//!
//! [rate_limit]
//! period = 5
//! threshold = 100
//! cache_capacity = 100
//!
//! [transport]
//! socket_path = "/dev/unix/socket/hisysevent"
//! priority_socket_path = "/dev/unix/socket/hisysevent_fast"
//! retry_times = 3
//! retry_queue_size = 10
//! max_data_size = 393216
//!
//! [log]
//! level = "warn"
//! format = "console"
//! ```

mod error;
mod logging;
mod rate_limit;
mod transport;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use rate_limit::{DEFAULT_CACHE_CAPACITY, DEFAULT_PERIOD, DEFAULT_THRESHOLD, RateLimitConfig};
pub use transport::{
    DEFAULT_PRIORITY_SOCKET_PATH, DEFAULT_RETRY_QUEUE_SIZE, DEFAULT_RETRY_TIMES,
    DEFAULT_SOCKET_PATH, TransportConfig,
};

use serde::Deserialize;

/// Domains masked by default, baked in at build time
///
/// Taken from the `SYSEVENT_DOMAIN_MASKS` environment variable as a
/// `|`-separated list. A `masked_domains` entry in the config file replaces
/// it.
pub const BUILD_DOMAIN_MASKS: &str = match option_env!("SYSEVENT_DOMAIN_MASKS") {
    Some(masks) => masks,
    None => "",
};

/// Split a `|`-separated domain list, skipping blank entries
pub fn parse_domain_masks(list: &str) -> Vec<String> {
    list.split('|')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Domains whose events are dropped before any other work
    pub masked_domains: Vec<String>,

    /// Per call-site write throttling
    pub rate_limit: RateLimitConfig,

    /// Socket paths, retries, and size limits
    pub transport: TransportConfig,

    /// Client diagnostics
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            masked_domains: parse_domain_masks(BUILD_DOMAIN_MASKS),
            rate_limit: RateLimitConfig::default(),
            transport: TransportConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.masked_domains, parse_domain_masks(BUILD_DOMAIN_MASKS));
        assert_eq!(config.transport.retry_times, DEFAULT_RETRY_TIMES);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
masked_domains = ["NOISY", "DEBUG"]

[rate_limit]
period = 10
threshold = 20
cache_capacity = 50

[transport]
socket_path = "/run/sysevent.sock"
priority_socket_path = "/run/sysevent_fast.sock"
retry_times = 5
retry_queue_size = 4
max_data_size = 65536

[log]
level = "debug"
format = "json"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.masked_domains, vec!["NOISY", "DEBUG"]);
        assert_eq!(config.rate_limit.period, 10);
        assert_eq!(config.rate_limit.threshold, 20);
        assert_eq!(config.rate_limit.cache_capacity, 50);
        assert_eq!(config.transport.retry_times, 5);
        assert_eq!(config.transport.retry_queue_size, 4);
        assert_eq!(config.transport.max_data_size, 65536);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_parse_domain_masks() {
        assert_eq!(parse_domain_masks("NOISY|DEBUG"), vec!["NOISY", "DEBUG"]);
        assert_eq!(parse_domain_masks(" A | |B|"), vec!["A", "B"]);
        assert!(parse_domain_masks("").is_empty());
        assert!(parse_domain_masks("||").is_empty());
    }

    #[test]
    fn test_file_masks_replace_build_masks() {
        let config = Config::from_str("masked_domains = [\"NOISY\"]").unwrap();
        assert_eq!(config.masked_domains, vec!["NOISY"]);

        let config = Config::from_str("masked_domains = []").unwrap();
        assert!(config.masked_domains.is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_str("[rate_limit\nperiod = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_unknown_field_type() {
        assert!(Config::from_str("[rate_limit]\nperiod = \"five\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rate_limit]\nthreshold = 7").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.rate_limit.threshold, 7);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
