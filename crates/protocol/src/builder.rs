//! Record assembly
//!
//! `RecordBuilder` holds one event's header, optional trace info, and its
//! parameters (encoded as they are appended), then lays them out as:
//!
//! ```text
//! i32 total_length | header | [trace info] | i32 param_count | params...
//! ```

use bytes::Bytes;

use crate::buffer::RawBuffer;
use crate::error::ProtocolError;
use crate::header::{
    EventHeader, EventType, HEADER_SIZE, LENGTH_PREFIX_SIZE, PARAM_COUNT_SIZE, TRACE_INFO_SIZE,
    TraceInfo,
};
use crate::param::EncodedParam;
use crate::record::RawRecord;
use crate::timezone::parse_time_zone;
use crate::{MAX_DATA_SIZE, Result};

#[derive(Debug, Clone)]
struct Entry {
    param: EncodedParam,
    bytes: Bytes,
}

/// Builder for one encoded event record
///
/// # Example
///
/// ```
/// use sysevent_protocol::{EncodedParam, EventType, RecordBuilder};
///
/// let mut builder = RecordBuilder::new("KERNEL_VENDOR", "POWER_KEY", EventType::Behavior);
/// builder.timestamp(1_700_000_000_000).pid(42);
/// builder.append_value(EncodedParam::new("KEY_CODE", 116i32)).unwrap();
///
/// let record = builder.build().unwrap();
/// assert_eq!(record.declared_len(), Some(record.len()));
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    header: EventHeader,
    trace_info: TraceInfo,
    params: Vec<Entry>,
    raw: RawBuffer,
}

impl RecordBuilder {
    /// Create a builder bounded by `MAX_DATA_SIZE`
    pub fn new(domain: &str, name: &str, event_type: EventType) -> Self {
        Self::with_limit(domain, name, event_type, MAX_DATA_SIZE)
    }

    /// Create a builder whose records may not exceed `limit` bytes
    pub fn with_limit(domain: &str, name: &str, event_type: EventType, limit: usize) -> Self {
        Self {
            header: EventHeader::new(domain, name, event_type),
            trace_info: TraceInfo::default(),
            params: Vec::new(),
            raw: RawBuffer::with_limit(limit),
        }
    }

    // =========================================================================
    // Header setters
    // =========================================================================

    #[inline]
    pub fn timestamp(&mut self, timestamp_ms: u64) -> &mut Self {
        self.header.timestamp = timestamp_ms;
        self
    }

    /// Set the time zone from a `+HHMM` string; unknown strings map to `+0000`
    #[inline]
    pub fn time_zone(&mut self, tz: &str) -> &mut Self {
        self.header.time_zone = parse_time_zone(tz);
        self
    }

    #[inline]
    pub fn time_zone_index(&mut self, index: u8) -> &mut Self {
        self.header.time_zone = index;
        self
    }

    #[inline]
    pub fn uid(&mut self, uid: u32) -> &mut Self {
        self.header.uid = uid;
        self
    }

    #[inline]
    pub fn pid(&mut self, pid: u32) -> &mut Self {
        self.header.pid = pid;
        self
    }

    #[inline]
    pub fn tid(&mut self, tid: u32) -> &mut Self {
        self.header.tid = tid;
        self
    }

    #[inline]
    pub fn id(&mut self, id: u64) -> &mut Self {
        self.header.id = id;
        self
    }

    /// Attach trace info and set the header trace flag
    pub fn trace_info(&mut self, info: TraceInfo) -> &mut Self {
        self.trace_info = info;
        self.header.is_trace_opened = true;
        self
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Encode a parameter and add it to the record
    ///
    /// A parameter whose key is already present replaces the earlier one; the
    /// rest keep their order. If the encoded parameter would push the record
    /// past its limit, nothing is added and the error is returned.
    pub fn append_value(&mut self, param: EncodedParam) -> Result<()> {
        let bytes = param.encode()?;

        let existing = self.params.iter().position(|e| e.param.key() == param.key());
        let replaced = existing.map_or(0, |i| self.params[i].bytes.len());
        let projected = self.encoded_len() - replaced + bytes.len();
        if projected > self.raw.limit() {
            return Err(ProtocolError::buffer_overflow(
                bytes.len(),
                self.raw.limit().saturating_sub(self.encoded_len() - replaced),
            ));
        }

        if let Some(i) = existing {
            self.params.remove(i);
        }
        self.params.push(Entry { param, bytes });
        Ok(())
    }

    /// Size the record will have when built
    pub fn encoded_len(&self) -> usize {
        let trace = if self.header.is_trace_opened {
            TRACE_INFO_SIZE
        } else {
            0
        };
        LENGTH_PREFIX_SIZE
            + HEADER_SIZE
            + trace
            + PARAM_COUNT_SIZE
            + self.params.iter().map(|e| e.bytes.len()).sum::<usize>()
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Lay out the record and patch its length prefix
    ///
    /// Rebuilds from scratch each time, so repeated calls give equal bytes.
    pub fn build(&mut self) -> Result<RawRecord> {
        self.raw.reset();
        self.raw.append(&0i32.to_le_bytes())?;
        self.header.write_to(&mut self.raw)?;
        if self.header.is_trace_opened {
            self.trace_info.write_to(&mut self.raw)?;
        }

        let count = i32::try_from(self.params.len())
            .map_err(|_| ProtocolError::buffer_overflow(self.params.len(), i32::MAX as usize))?;
        self.raw.append(&count.to_le_bytes())?;
        for entry in &self.params {
            self.raw.append(&entry.bytes)?;
        }

        let total = i32::try_from(self.raw.len())
            .map_err(|_| ProtocolError::buffer_overflow(self.raw.len(), i32::MAX as usize))?;
        self.raw.update(&total.to_le_bytes(), 0)?;

        Ok(RawRecord::new(self.raw.to_bytes()))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn domain(&self) -> &str {
        &self.header.domain
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.header.name
    }

    #[inline]
    pub fn event_type(&self) -> EventType {
        self.header.event_type
    }

    #[inline]
    pub fn header(&self) -> &EventHeader {
        &self.header
    }

    /// Trace info, if any was attached
    pub fn get_trace_info(&self) -> Option<&TraceInfo> {
        self.header.is_trace_opened.then_some(&self.trace_info)
    }

    #[inline]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Look up a parameter by key
    pub fn get_value(&self, key: &str) -> Option<&EncodedParam> {
        self.params
            .iter()
            .find(|e| e.param.key() == key)
            .map(|e| &e.param)
    }

    /// Parameters in record order
    pub fn params(&self) -> impl Iterator<Item = &EncodedParam> {
        self.params.iter().map(|e| &e.param)
    }
}
