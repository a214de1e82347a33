//! Error types for sending and writing events
//!
//! Typed errors stay inside the crate's Rust API; the `Writer` maps them to
//! integer status codes at its public boundary.

use std::io;
use std::path::Path;

use sysevent_protocol::ProtocolError;
use thiserror::Error;

use crate::ret_code;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors from the datagram transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// Record has no bytes
    #[error("record is empty")]
    EmptyRecord,

    /// Record larger than the configured maximum
    #[error("record size {size} exceeds maximum {max}")]
    OverSize {
        /// Actual record size
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// Socket could not be created or configured
    #[error("failed to create socket: {0}")]
    SocketCreate(#[source] io::Error),

    /// Every send attempt failed
    #[error("send to '{path}' failed after {attempts} attempts: {source}")]
    SendFailed {
        /// Destination socket path
        path: String,
        /// Attempts made
        attempts: u32,
        /// Error from the last attempt
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Create a SendFailed error
    pub fn send_failed(path: &Path, attempts: u32, source: io::Error) -> Self {
        Self::SendFailed {
            path: path.display().to_string(),
            attempts,
            source,
        }
    }

    /// Check if the failure was the receiver being busy rather than absent
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SendFailed { source, .. }
                if matches!(source.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
        )
    }

    /// Status code for this error
    pub fn code(&self) -> i32 {
        match self {
            Self::EmptyRecord => ret_code::ERR_EMPTY_EVENT,
            Self::OverSize { .. } => ret_code::ERR_OVER_SIZE,
            Self::SocketCreate(_) => ret_code::ERR_DOES_NOT_INIT,
            Self::SendFailed { .. } => ret_code::ERR_SEND_FAIL,
        }
    }
}

/// Reasons a write sent nothing
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("domain '{0}' is masked")]
    DomainMasked(String),

    #[error("write frequency too high for {domain}/{name}")]
    RateLimited { domain: String, name: String },

    #[error("invalid domain '{0}'")]
    InvalidDomain(String),

    #[error("invalid event name '{0}'")]
    InvalidEventName(String),

    #[error("invalid event type {0}")]
    InvalidEventType(i32),

    #[error("failed to encode record: {0}")]
    Encode(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl WriteError {
    /// Status code for this error
    pub fn code(&self) -> i32 {
        match self {
            Self::DomainMasked(_) => ret_code::ERR_DOMAIN_MASKED,
            Self::RateLimited { .. } => ret_code::ERR_WRITE_IN_HIGH_FREQ,
            Self::InvalidDomain(_) => ret_code::ERR_DOMAIN_NAME_INVALID,
            Self::InvalidEventName(_) => ret_code::ERR_EVENT_NAME_INVALID,
            Self::InvalidEventType(_) => ret_code::ERR_TYPE_INVALID,
            Self::Encode(e) if e.is_overflow() => ret_code::ERR_OVER_SIZE,
            Self::Encode(_) => ret_code::ERR_ENCODE_FAILED,
            Self::Transport(e) => e.code(),
        }
    }

    /// Masked and rate-limited writes are expected drops, not failures
    pub fn is_expected_drop(&self) -> bool {
        matches!(self, Self::DomainMasked(_) | Self::RateLimited { .. })
    }
}
