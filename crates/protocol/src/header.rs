//! Fixed-size record header and trace info
//!
//! # Header Layout (80 bytes, packed, little-endian)
//!
//! ```text
//! offset  size  field
//! 0       17    domain (NUL-padded)
//! 17      33    name (NUL-padded)
//! 50      8     timestamp (ms since epoch)
//! 58      1     time zone index
//! 59      4     uid
//! 63      4     pid
//! 67      4     tid
//! 71      8     id
//! 79      1     flags: bit 0-1 event type - 1, bit 2 trace info present
//! ```
//!
//! # Trace Info Layout (17 bytes)
//!
//! ```text
//! 0   1  trace flag
//! 1   8  trace id
//! 9   4  span id
//! 13  4  parent span id
//! ```

use crate::buffer::RawBuffer;
use crate::error::ProtocolError;
use crate::timezone::DEFAULT_TIME_ZONE_INDEX;
use crate::{MAX_DOMAIN_LENGTH, MAX_EVENT_NAME_LENGTH, Result};

/// Size of the packed header
pub const HEADER_SIZE: usize = 80;

/// Size of the packed trace info block
pub const TRACE_INFO_SIZE: usize = 17;

/// Size of the leading `i32` total length
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of the `i32` parameter count after header and trace info
pub const PARAM_COUNT_SIZE: usize = 4;

const DOMAIN_FIELD_SIZE: usize = MAX_DOMAIN_LENGTH + 1;
const NAME_FIELD_SIZE: usize = MAX_EVENT_NAME_LENGTH + 1;

const TYPE_MASK: u8 = 0b0000_0011;
const TRACE_FLAG: u8 = 0b0000_0100;

// =============================================================================
// EventType
// =============================================================================

/// Event category
///
/// Public values are 1-based; the header stores `value - 1` in two bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EventType {
    Fault = 1,
    Statistic = 2,
    Security = 3,
    Behavior = 4,
}

impl EventType {
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Two-bit value stored in the header flags
    #[inline]
    const fn to_internal(self) -> u8 {
        (self as i32 - 1) as u8
    }

    #[inline]
    const fn from_internal(bits: u8) -> Self {
        match bits & TYPE_MASK {
            0 => Self::Fault,
            1 => Self::Statistic,
            2 => Self::Security,
            _ => Self::Behavior,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fault => "FAULT",
            Self::Statistic => "STATISTIC",
            Self::Security => "SECURITY",
            Self::Behavior => "BEHAVIOR",
        }
    }
}

impl TryFrom<i32> for EventType {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Self::Fault),
            2 => Ok(Self::Statistic),
            3 => Ok(Self::Security),
            4 => Ok(Self::Behavior),
            other => Err(ProtocolError::InvalidEventType(other)),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pack event type and trace presence into the header flag byte
#[inline]
pub fn pack_flags(event_type: EventType, has_trace: bool) -> u8 {
    let trace = if has_trace { TRACE_FLAG } else { 0 };
    event_type.to_internal() | trace
}

/// Split the header flag byte back into event type and trace presence
#[inline]
pub fn unpack_flags(flags: u8) -> (EventType, bool) {
    (EventType::from_internal(flags), flags & TRACE_FLAG != 0)
}

// =============================================================================
// EventHeader
// =============================================================================

/// Fixed-size record header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHeader {
    pub domain: String,
    pub name: String,
    pub timestamp: u64,
    pub time_zone: u8,
    pub uid: u32,
    pub pid: u32,
    pub tid: u32,
    pub id: u64,
    pub event_type: EventType,
    pub is_trace_opened: bool,
}

impl EventHeader {
    /// Create a header with zeroed identity fields and UTC time zone
    pub fn new(domain: &str, name: &str, event_type: EventType) -> Self {
        Self {
            domain: truncated(domain, MAX_DOMAIN_LENGTH).to_owned(),
            name: truncated(name, MAX_EVENT_NAME_LENGTH).to_owned(),
            timestamp: 0,
            time_zone: DEFAULT_TIME_ZONE_INDEX,
            uid: 0,
            pid: 0,
            tid: 0,
            id: 0,
            event_type,
            is_trace_opened: false,
        }
    }

    #[inline]
    pub fn flags(&self) -> u8 {
        pack_flags(self.event_type, self.is_trace_opened)
    }

    /// Append the packed 80-byte header
    pub fn write_to(&self, buf: &mut RawBuffer) -> Result<()> {
        let mut out = [0u8; HEADER_SIZE];
        copy_name(&mut out[..DOMAIN_FIELD_SIZE], &self.domain);
        copy_name(
            &mut out[DOMAIN_FIELD_SIZE..DOMAIN_FIELD_SIZE + NAME_FIELD_SIZE],
            &self.name,
        );

        let mut pos = DOMAIN_FIELD_SIZE + NAME_FIELD_SIZE;
        put(&mut out, &mut pos, &self.timestamp.to_le_bytes());
        put(&mut out, &mut pos, &[self.time_zone]);
        put(&mut out, &mut pos, &self.uid.to_le_bytes());
        put(&mut out, &mut pos, &self.pid.to_le_bytes());
        put(&mut out, &mut pos, &self.tid.to_le_bytes());
        put(&mut out, &mut pos, &self.id.to_le_bytes());
        put(&mut out, &mut pos, &[self.flags()]);
        debug_assert_eq!(pos, HEADER_SIZE);

        buf.append(&out)
    }

    /// Parse a header from the first 80 bytes of `data`
    pub fn read_from(data: &[u8]) -> Result<Self> {
        let bytes: &[u8; HEADER_SIZE] = data
            .get(..HEADER_SIZE)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(ProtocolError::too_short(HEADER_SIZE, data.len()))?;

        let domain = read_name(&bytes[..DOMAIN_FIELD_SIZE], "domain")?;
        let name = read_name(
            &bytes[DOMAIN_FIELD_SIZE..DOMAIN_FIELD_SIZE + NAME_FIELD_SIZE],
            "event name",
        )?;

        let mut pos = DOMAIN_FIELD_SIZE + NAME_FIELD_SIZE;
        let timestamp = u64::from_le_bytes(take(bytes, &mut pos));
        let [time_zone] = take::<1>(bytes, &mut pos);
        let uid = u32::from_le_bytes(take(bytes, &mut pos));
        let pid = u32::from_le_bytes(take(bytes, &mut pos));
        let tid = u32::from_le_bytes(take(bytes, &mut pos));
        let id = u64::from_le_bytes(take(bytes, &mut pos));
        let [flags] = take::<1>(bytes, &mut pos);
        let (event_type, is_trace_opened) = unpack_flags(flags);

        Ok(Self {
            domain,
            name,
            timestamp,
            time_zone,
            uid,
            pid,
            tid,
            id,
            event_type,
            is_trace_opened,
        })
    }
}

// =============================================================================
// TraceInfo
// =============================================================================

/// Distributed-trace identifiers attached to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceInfo {
    pub trace_flag: u8,
    pub trace_id: u64,
    pub span_id: u32,
    pub parent_span_id: u32,
}

impl TraceInfo {
    pub const fn new(trace_id: u64, span_id: u32, parent_span_id: u32, trace_flag: u8) -> Self {
        Self {
            trace_flag,
            trace_id,
            span_id,
            parent_span_id,
        }
    }

    /// A zero trace id means no trace
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.trace_id != 0
    }

    pub fn write_to(&self, buf: &mut RawBuffer) -> Result<()> {
        let mut out = [0u8; TRACE_INFO_SIZE];
        let mut pos = 0;
        put(&mut out, &mut pos, &[self.trace_flag]);
        put(&mut out, &mut pos, &self.trace_id.to_le_bytes());
        put(&mut out, &mut pos, &self.span_id.to_le_bytes());
        put(&mut out, &mut pos, &self.parent_span_id.to_le_bytes());
        buf.append(&out)
    }

    pub fn read_from(data: &[u8]) -> Result<Self> {
        let bytes: &[u8; TRACE_INFO_SIZE] = data
            .get(..TRACE_INFO_SIZE)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(ProtocolError::too_short(TRACE_INFO_SIZE, data.len()))?;

        let mut pos = 0;
        let [trace_flag] = take::<1>(bytes, &mut pos);
        Ok(Self {
            trace_flag,
            trace_id: u64::from_le_bytes(take(bytes, &mut pos)),
            span_id: u32::from_le_bytes(take(bytes, &mut pos)),
            parent_span_id: u32::from_le_bytes(take(bytes, &mut pos)),
        })
    }
}

// =============================================================================
// Field helpers
// =============================================================================

/// Longest prefix of `s` within `max` bytes, cut on a char boundary
fn truncated(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Copy a name into a NUL-padded field, leaving the last byte as terminator
fn copy_name(field: &mut [u8], name: &str) {
    let len = name.len().min(field.len() - 1);
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
}

fn read_name(field: &[u8], what: &'static str) -> Result<String> {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(str::to_owned)
        .map_err(|_| ProtocolError::InvalidUtf8(what))
}

#[inline]
fn put(out: &mut [u8], pos: &mut usize, bytes: &[u8]) {
    out[*pos..*pos + bytes.len()].copy_from_slice(bytes);
    *pos += bytes.len();
}

#[inline]
fn take<const N: usize>(bytes: &[u8], pos: &mut usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[*pos..*pos + N]);
    *pos += N;
    out
}
