//! SysEvent Protocol - binary record format for system event telemetry
//!
//! This crate defines the bytes a client hands to the event daemon:
//! - `RawBuffer` - Bounded, growable byte buffer with in-place patching
//! - `EncodedParam` / `ParamValue` - Typed key/value parameters
//! - `EventHeader` / `TraceInfo` - Fixed-size record prefix
//! - `RecordBuilder` - Assembles a complete length-prefixed record
//! - `decode_record` - Parses a record back into its parts
//!
//! # Wire Format
//!
//! All fixed-width integers are little-endian and structures are packed.
//!
//! ```text
//! i32 total_length | header (80B) | [trace info (17B)] | i32 param_count | params...
//! ```
//!
//! Each parameter is its key (length-delimited string), one packed type byte,
//! an optional varint element count for arrays, then the payload.

mod buffer;
mod builder;
mod error;
mod filter;
mod header;
mod param;
mod record;
mod timezone;
mod value;
pub mod varint;

pub use buffer::RawBuffer;
pub use builder::RecordBuilder;
pub use error::ProtocolError;
pub use filter::{escape_to_raw, is_valid_name, unescape_raw};
pub use header::{
    EventHeader, EventType, HEADER_SIZE, LENGTH_PREFIX_SIZE, PARAM_COUNT_SIZE, TRACE_INFO_SIZE,
    TraceInfo, pack_flags, unpack_flags,
};
pub use param::{EncodedParam, decode_param};
pub use record::{DecodedRecord, RawRecord, decode_record, peek_header};
pub use timezone::{
    ALL_TIME_ZONES, DEFAULT_TIME_ZONE_INDEX, local_time_zone, parse_time_zone,
    time_zone_from_index,
};
pub use value::{ParamValue, ParamValueType, ValueType};

pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Maximum domain length in bytes (stored in a 17-byte field)
pub const MAX_DOMAIN_LENGTH: usize = 16;

/// Maximum event name length in bytes (stored in a 33-byte field)
pub const MAX_EVENT_NAME_LENGTH: usize = 32;

/// Maximum parameter key length in bytes
pub const MAX_PARAM_NAME_LENGTH: usize = 48;

/// Maximum number of parameters in one event
pub const MAX_PARAM_NUMBER: usize = 128;

/// Maximum number of elements in an array parameter
pub const MAX_ARRAY_SIZE: usize = 100;

/// Maximum length of a single string value (256KB)
pub const MAX_STRING_LENGTH: usize = 256 * 1024;

/// Maximum size of an encoded record (384KB)
pub const MAX_DATA_SIZE: usize = 384 * 1024;
