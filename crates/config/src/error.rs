//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A field holds a value outside its allowed range
    #[error("[{section}] has invalid {field}: {message}")]
    InvalidValue {
        /// Section name (e.g., "rate_limit", "transport")
        section: &'static str,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// A masked domain would never pass name validation
    #[error("masked domain '{domain}' is not a valid domain name")]
    InvalidMaskedDomain {
        /// The offending entry
        domain: String,
    },
}

impl ConfigError {
    /// Create an InvalidValue error
    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }

    /// Create an InvalidMaskedDomain error
    pub fn invalid_masked_domain(domain: impl Into<String>) -> Self {
        Self::InvalidMaskedDomain {
            domain: domain.into(),
        }
    }
}
