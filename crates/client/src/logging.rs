//! Diagnostic logging setup
//!
//! The client only emits `tracing` events. Applications that have no
//! subscriber of their own can install one from a [`LogConfig`].

use sysevent_config::{LogConfig, LogFormat, LogOutput};
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const FALLBACK_DIRECTIVES: &str = "warn";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),
}

/// Install a global subscriber
///
/// An invalid filter falls back to `warn`. Returns `Ok(false)` when another
/// subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<bool, LoggingError> {
    let filter = build_filter(config)?;

    let installed = tracing_subscriber::registry()
        .with(fmt_layer(config))
        .with(filter)
        .try_init()
        .is_ok();

    Ok(installed)
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter, LoggingError> {
    let filter = EnvFilter::try_new(config.directives())
        .or_else(|_| EnvFilter::try_new(FALLBACK_DIRECTIVES))?;
    Ok(filter)
}

fn fmt_layer(config: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = fmt::layer().with_target(true).with_thread_ids(false);

    match (config.format, config.output) {
        (LogFormat::Console, LogOutput::Stdout) => layer.with_writer(std::io::stdout).boxed(),
        (LogFormat::Console, LogOutput::Stderr) => layer.with_writer(std::io::stderr).boxed(),
        (LogFormat::Json, LogOutput::Stdout) => layer.json().with_writer(std::io::stdout).boxed(),
        (LogFormat::Json, LogOutput::Stderr) => layer.json().with_writer(std::io::stderr).boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysevent_config::LogLevel;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_filter_from_level() {
        let config = LogConfig {
            level: LogLevel::Debug,
            ..LogConfig::default()
        };
        let filter = build_filter(&config).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let config = LogConfig {
            filter: Some("sysevent_client=notalevel".to_string()),
            ..LogConfig::default()
        };
        let filter = build_filter(&config).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_second_init_is_noop() {
        let config = LogConfig::default();
        let _ = init(&config).unwrap();
        assert!(!init(&config).unwrap());
    }
}
