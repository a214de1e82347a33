//! Protocol error types
//!
//! Errors that can occur when encoding or decoding event records.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Append would grow the buffer past its limit
    #[error("buffer overflow: {requested} bytes requested, {remaining} bytes remaining")]
    BufferOverflow { requested: usize, remaining: usize },

    /// In-place update falls outside the written region
    #[error("update out of range: {len} bytes at offset {offset}, buffer holds {buffer_len}")]
    UpdateOutOfRange {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },

    /// Input ended before a field was complete
    #[error("message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort { expected: usize, actual: usize },

    /// Varint ran past ten bytes or overflowed its target width
    #[error("invalid varint at offset {0}")]
    InvalidVarint(usize),

    /// Type byte carries an unknown value type
    #[error("invalid value type: {0}")]
    InvalidValueType(u8),

    /// Event type outside 1..=4
    #[error("invalid event type: {0}")]
    InvalidEventType(i32),

    /// Decoded integer does not fit the declared value type
    #[error("value {value} out of range for {target}")]
    ValueOutOfRange { value: i128, target: &'static str },

    /// String field is not valid UTF-8
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),

    /// Array element count above the allowed maximum
    #[error("array too large: {count} elements exceeds maximum {max}")]
    ArrayTooLarge { count: usize, max: usize },

    /// Length prefix disagrees with the bytes present
    #[error("length prefix {declared} does not match record size {actual}")]
    LengthMismatch { declared: i64, actual: usize },
}

impl ProtocolError {
    /// Create a buffer overflow error
    #[inline]
    pub fn buffer_overflow(requested: usize, remaining: usize) -> Self {
        Self::BufferOverflow {
            requested,
            remaining,
        }
    }

    /// Create a message too short error
    #[inline]
    pub fn too_short(expected: usize, actual: usize) -> Self {
        Self::MessageTooShort { expected, actual }
    }

    /// Create a value out of range error
    #[inline]
    pub fn out_of_range(value: impl Into<i128>, target: &'static str) -> Self {
        Self::ValueOutOfRange {
            value: value.into(),
            target,
        }
    }

    /// Check if this error came from a full buffer
    #[inline]
    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::BufferOverflow { .. })
    }
}
