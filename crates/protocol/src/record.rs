//! Encoded records and their decoder

use bytes::Bytes;

use crate::error::ProtocolError;
use crate::header::{
    EventHeader, HEADER_SIZE, LENGTH_PREFIX_SIZE, PARAM_COUNT_SIZE, TRACE_INFO_SIZE, TraceInfo,
};
use crate::param::{EncodedParam, decode_param};
use crate::Result;

/// A fully encoded, length-prefixed event record
///
/// Cheap to clone; the bytes are reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    bytes: Bytes,
}

impl RawRecord {
    #[inline]
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Value of the leading length prefix, if present and non-negative
    pub fn declared_len(&self) -> Option<usize> {
        let prefix: [u8; LENGTH_PREFIX_SIZE] = self.bytes.get(..LENGTH_PREFIX_SIZE)?.try_into().ok()?;
        usize::try_from(i32::from_le_bytes(prefix)).ok()
    }

    /// Parse just the header
    pub fn header(&self) -> Result<EventHeader> {
        peek_header(&self.bytes)
    }

    pub fn decode(&self) -> Result<DecodedRecord> {
        decode_record(&self.bytes)
    }
}

impl From<Bytes> for RawRecord {
    fn from(bytes: Bytes) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for RawRecord {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A record split back into header, trace info, and parameters
///
/// String values are returned as they appear on the wire (escaped).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub header: EventHeader,
    pub trace_info: Option<TraceInfo>,
    pub params: Vec<EncodedParam>,
}

impl DecodedRecord {
    pub fn get(&self, key: &str) -> Option<&EncodedParam> {
        self.params.iter().find(|p| p.key() == key)
    }
}

/// Parse the header that follows the length prefix
pub fn peek_header(data: &[u8]) -> Result<EventHeader> {
    let body = data
        .get(LENGTH_PREFIX_SIZE..)
        .ok_or(ProtocolError::too_short(LENGTH_PREFIX_SIZE + HEADER_SIZE, data.len()))?;
    EventHeader::read_from(body)
        .map_err(|_| ProtocolError::too_short(LENGTH_PREFIX_SIZE + HEADER_SIZE, data.len()))
}

/// Decode a complete record
pub fn decode_record(data: &[u8]) -> Result<DecodedRecord> {
    let min = LENGTH_PREFIX_SIZE + HEADER_SIZE + PARAM_COUNT_SIZE;
    if data.len() < min {
        return Err(ProtocolError::too_short(min, data.len()));
    }

    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&data[..LENGTH_PREFIX_SIZE]);
    let declared = i32::from_le_bytes(prefix);
    if usize::try_from(declared).ok() != Some(data.len()) {
        return Err(ProtocolError::LengthMismatch {
            declared: declared.into(),
            actual: data.len(),
        });
    }

    let header = EventHeader::read_from(&data[LENGTH_PREFIX_SIZE..])?;
    let mut offset = LENGTH_PREFIX_SIZE + HEADER_SIZE;

    let trace_info = if header.is_trace_opened {
        let info = TraceInfo::read_from(&data[offset..])?;
        offset += TRACE_INFO_SIZE;
        Some(info)
    } else {
        None
    };

    let count_bytes = data
        .get(offset..offset + PARAM_COUNT_SIZE)
        .ok_or(ProtocolError::too_short(offset + PARAM_COUNT_SIZE, data.len()))?;
    let mut count = [0u8; PARAM_COUNT_SIZE];
    count.copy_from_slice(count_bytes);
    let count = i32::from_le_bytes(count);
    offset += PARAM_COUNT_SIZE;

    let count = usize::try_from(count).map_err(|_| ProtocolError::LengthMismatch {
        declared: count.into(),
        actual: 0,
    })?;
    let mut params = Vec::with_capacity(count.min(crate::MAX_PARAM_NUMBER));
    for _ in 0..count {
        params.push(decode_param(data, &mut offset)?);
    }

    if offset != data.len() {
        return Err(ProtocolError::LengthMismatch {
            declared: declared.into(),
            actual: offset,
        });
    }

    Ok(DecodedRecord {
        header,
        trace_info,
        params,
    })
}
