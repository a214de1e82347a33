//! Tagged varint codec
//!
//! The first byte of every varint is a tag byte:
//!
//! ```text
//! bit 7-6: encode type (0 = varint value, 1 = length of a delimited field)
//! bit 5:   continuation
//! bit 4-0: low 5 bits of the value
//! ```
//!
//! Following bytes carry 7 value bits each, least significant first, with
//! bit 7 set when more bytes follow. Signed values are written as
//! sign-magnitude: `(|v| << 1) | negative`.

use crate::buffer::RawBuffer;
use crate::error::ProtocolError;
use crate::Result;

/// Longest possible encoding (65 bits: 5 in the tag byte, 60 in nine more)
pub const MAX_VARINT_BYTES: usize = 10;

const TAG_BYTE_OFFSET: u32 = 5;
const TAG_BYTE_BOUND: u128 = 1 << TAG_BYTE_OFFSET;
const TAG_BYTE_MASK: u128 = TAG_BYTE_BOUND - 1;
const TAG_CONTINUATION: u8 = 0x20;
const ENCODE_TYPE_SHIFT: u8 = 6;

const NON_TAG_BYTE_OFFSET: u32 = 7;
const NON_TAG_BYTE_BOUND: u128 = 1 << NON_TAG_BYTE_OFFSET;
const NON_TAG_BYTE_MASK: u128 = NON_TAG_BYTE_BOUND - 1;
const NON_TAG_CONTINUATION: u8 = 0x80;

/// What the varint describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncodeType {
    /// The varint is the value itself
    Varint = 0,
    /// The varint is the byte length of the field that follows
    LengthDelimited = 1,
}

impl EncodeType {
    #[inline]
    fn from_tag(tag: u8) -> Self {
        match tag >> ENCODE_TYPE_SHIFT {
            1 => Self::LengthDelimited,
            _ => Self::Varint,
        }
    }
}

fn encode_raw(encode_type: EncodeType, value: u128) -> ([u8; MAX_VARINT_BYTES], usize) {
    let mut out = [0u8; MAX_VARINT_BYTES];
    let continuation = if value >= TAG_BYTE_BOUND {
        TAG_CONTINUATION
    } else {
        0
    };
    out[0] = ((encode_type as u8) << ENCODE_TYPE_SHIFT)
        | continuation
        | (value & TAG_BYTE_MASK) as u8;

    let mut rest = value >> TAG_BYTE_OFFSET;
    let mut len = 1;
    while rest > 0 && len < MAX_VARINT_BYTES {
        let continuation = if rest >= NON_TAG_BYTE_BOUND {
            NON_TAG_CONTINUATION
        } else {
            0
        };
        out[len] = continuation | (rest & NON_TAG_BYTE_MASK) as u8;
        rest >>= NON_TAG_BYTE_OFFSET;
        len += 1;
    }
    (out, len)
}

#[inline]
fn sign_magnitude(value: i64) -> u128 {
    let magnitude = (value as i128).unsigned_abs();
    (magnitude << 1) | u128::from(value < 0)
}

/// Encode an unsigned value, all bytes or none
pub fn write_unsigned(buf: &mut RawBuffer, encode_type: EncodeType, value: u64) -> Result<()> {
    let (bytes, len) = encode_raw(encode_type, u128::from(value));
    buf.append(&bytes[..len])
}

/// Encode a signed value in sign-magnitude form, all bytes or none
pub fn write_signed(buf: &mut RawBuffer, encode_type: EncodeType, value: i64) -> Result<()> {
    let (bytes, len) = encode_raw(encode_type, sign_magnitude(value));
    buf.append(&bytes[..len])
}

/// Encoded size of an unsigned value
pub fn unsigned_len(value: u64) -> usize {
    encode_raw(EncodeType::Varint, u128::from(value)).1
}

/// Decode one varint starting at `*offset`, advancing the offset past it
pub fn read_raw(data: &[u8], offset: &mut usize) -> Result<(EncodeType, u128)> {
    let start = *offset;
    let tag = *data
        .get(start)
        .ok_or(ProtocolError::too_short(start + 1, data.len()))?;
    let mut pos = start + 1;

    let mut value = u128::from(tag) & TAG_BYTE_MASK;
    let mut more = tag & TAG_CONTINUATION != 0;
    let mut shift = TAG_BYTE_OFFSET;
    while more {
        if pos - start >= MAX_VARINT_BYTES {
            return Err(ProtocolError::InvalidVarint(start));
        }
        let byte = *data
            .get(pos)
            .ok_or(ProtocolError::too_short(pos + 1, data.len()))?;
        value |= (u128::from(byte) & NON_TAG_BYTE_MASK) << shift;
        shift += NON_TAG_BYTE_OFFSET;
        more = byte & NON_TAG_CONTINUATION != 0;
        pos += 1;
    }

    *offset = pos;
    Ok((EncodeType::from_tag(tag), value))
}

/// Decode an unsigned varint
pub fn read_unsigned(data: &[u8], offset: &mut usize) -> Result<(EncodeType, u64)> {
    let start = *offset;
    let (encode_type, raw) = read_raw(data, offset)?;
    let value = u64::try_from(raw).map_err(|_| ProtocolError::InvalidVarint(start))?;
    Ok((encode_type, value))
}

/// Decode a sign-magnitude varint
pub fn read_signed(data: &[u8], offset: &mut usize) -> Result<(EncodeType, i64)> {
    let start = *offset;
    let (encode_type, raw) = read_raw(data, offset)?;
    let magnitude = raw >> 1;
    let signed = if raw & 1 == 1 {
        -(magnitude as i128)
    } else {
        magnitude as i128
    };
    let value = i64::try_from(signed).map_err(|_| ProtocolError::InvalidVarint(start))?;
    Ok((encode_type, value))
}
