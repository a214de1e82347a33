//! Logging configuration
//!
//! Controls the client's own diagnostics (dropped writes, queue evictions,
//! send failures). The client is embedded in other processes, so it defaults
//! to warnings on stderr.

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Degraded writes and evictions (default)
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON structured logging
    Json,
}

/// Log output destination
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    /// Write to stderr (default)
    #[default]
    Stderr,
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "debug"
/// format = "json"
/// output = "stderr"
/// filter = "sysevent_client::transport=trace"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Base level when `filter` is absent or invalid
    pub level: LogLevel,

    pub format: LogFormat,

    pub output: LogOutput,

    /// Full `EnvFilter` directive string, overrides `level`
    pub filter: Option<String>,
}

impl LogConfig {
    /// Directive string handed to the subscriber's filter
    pub fn directives(&self) -> &str {
        self.filter.as_deref().unwrap_or(self.level.as_str())
    }
}
