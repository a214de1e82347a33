//! Parameter encoding and decoding
//!
//! # Wire Layout
//!
//! ```text
//! key:        length-delimited varint + UTF-8 bytes
//! type byte:  ParamValueType::pack()
//! [count]:    varint element count (arrays only)
//! payload:    signed varint   bool, int8..int64
//!             unsigned varint uint8..uint64
//!             4 / 8 LE bytes  float / double
//!             length-delimited escaped UTF-8 string
//! ```

use bytes::Bytes;

use crate::buffer::RawBuffer;
use crate::error::ProtocolError;
use crate::filter::escape_to_raw;
use crate::value::{ParamValue, ParamValueType, ValueType};
use crate::varint::{self, EncodeType};
use crate::{MAX_ARRAY_SIZE, MAX_DATA_SIZE, Result};

/// A named, typed parameter
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedParam {
    key: String,
    value: ParamValue,
}

impl EncodedParam {
    pub fn new(key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut ParamValue {
        &mut self.value
    }

    pub fn into_parts(self) -> (String, ParamValue) {
        (self.key, self.value)
    }

    /// Encode into a standalone buffer bounded by `MAX_DATA_SIZE`
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = RawBuffer::with_limit(MAX_DATA_SIZE);
        self.encode_into(&mut buf)?;
        Ok(buf.take())
    }

    /// Append the encoded parameter to `buf`
    ///
    /// On error the buffer may hold a partial parameter; callers that need
    /// atomicity encode into a scratch buffer first (see `encode`).
    pub fn encode_into(&self, buf: &mut RawBuffer) -> Result<()> {
        write_string(buf, &self.key)?;
        buf.append_u8(self.value.param_value_type().pack())?;

        match &self.value {
            ParamValue::Bool(v) => write_signed(buf, *v),
            ParamValue::Int8(v) => write_signed(buf, *v),
            ParamValue::Int16(v) => write_signed(buf, *v),
            ParamValue::Int32(v) => write_signed(buf, *v),
            ParamValue::Int64(v) => write_signed(buf, *v),
            ParamValue::Uint8(v) => write_unsigned(buf, *v),
            ParamValue::Uint16(v) => write_unsigned(buf, *v),
            ParamValue::Uint32(v) => write_unsigned(buf, *v),
            ParamValue::Uint64(v) => write_unsigned(buf, *v),
            ParamValue::Float(v) => buf.append(&v.to_le_bytes()),
            ParamValue::Double(v) => buf.append(&v.to_le_bytes()),
            ParamValue::String(v) => write_string(buf, &escape_to_raw(v)),
            ParamValue::BoolArray(vs) => write_array(buf, vs, |b, v| write_signed(b, *v)),
            ParamValue::Int8Array(vs) => write_array(buf, vs, |b, v| write_signed(b, *v)),
            ParamValue::Int16Array(vs) => write_array(buf, vs, |b, v| write_signed(b, *v)),
            ParamValue::Int32Array(vs) => write_array(buf, vs, |b, v| write_signed(b, *v)),
            ParamValue::Int64Array(vs) => write_array(buf, vs, |b, v| write_signed(b, *v)),
            ParamValue::Uint8Array(vs) => write_array(buf, vs, |b, v| write_unsigned(b, *v)),
            ParamValue::Uint16Array(vs) => write_array(buf, vs, |b, v| write_unsigned(b, *v)),
            ParamValue::Uint32Array(vs) => write_array(buf, vs, |b, v| write_unsigned(b, *v)),
            ParamValue::Uint64Array(vs) => write_array(buf, vs, |b, v| write_unsigned(b, *v)),
            ParamValue::FloatArray(vs) => write_array(buf, vs, |b, v| b.append(&v.to_le_bytes())),
            ParamValue::DoubleArray(vs) => {
                write_array(buf, vs, |b, v| b.append(&v.to_le_bytes()))
            }
            ParamValue::StringArray(vs) => {
                write_array(buf, vs, |b, v| write_string(b, &escape_to_raw(v)))
            }
        }
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    /// Unsigned scalar as `u64`
    pub fn as_u64(&self) -> Option<u64> {
        match self.value {
            ParamValue::Uint8(v) => Some(v.into()),
            ParamValue::Uint16(v) => Some(v.into()),
            ParamValue::Uint32(v) => Some(v.into()),
            ParamValue::Uint64(v) => Some(v),
            _ => None,
        }
    }

    /// Signed or bool scalar as `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match self.value {
            ParamValue::Bool(v) => Some(v.into()),
            ParamValue::Int8(v) => Some(v.into()),
            ParamValue::Int16(v) => Some(v.into()),
            ParamValue::Int32(v) => Some(v.into()),
            ParamValue::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// Float or double scalar as `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self.value {
            ParamValue::Float(v) => Some(v.into()),
            ParamValue::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Any scalar rendered as a string
    pub fn as_string(&self) -> Option<String> {
        if let ParamValue::String(s) = &self.value {
            return Some(s.clone());
        }
        self.as_u64()
            .map(|v| v.to_string())
            .or_else(|| self.as_i64().map(|v| v.to_string()))
            .or_else(|| self.as_f64().map(|v| v.to_string()))
    }

    pub fn as_u64_vec(&self) -> Option<Vec<u64>> {
        match &self.value {
            ParamValue::Uint8Array(vs) => Some(widen(vs)),
            ParamValue::Uint16Array(vs) => Some(widen(vs)),
            ParamValue::Uint32Array(vs) => Some(widen(vs)),
            ParamValue::Uint64Array(vs) => Some(vs.clone()),
            _ => None,
        }
    }

    pub fn as_i64_vec(&self) -> Option<Vec<i64>> {
        match &self.value {
            ParamValue::BoolArray(vs) => Some(widen(vs)),
            ParamValue::Int8Array(vs) => Some(widen(vs)),
            ParamValue::Int16Array(vs) => Some(widen(vs)),
            ParamValue::Int32Array(vs) => Some(widen(vs)),
            ParamValue::Int64Array(vs) => Some(vs.clone()),
            _ => None,
        }
    }

    pub fn as_f64_vec(&self) -> Option<Vec<f64>> {
        match &self.value {
            ParamValue::FloatArray(vs) => Some(widen(vs)),
            ParamValue::DoubleArray(vs) => Some(vs.clone()),
            _ => None,
        }
    }

    /// Any array rendered element-wise as strings
    pub fn as_string_vec(&self) -> Option<Vec<String>> {
        if let ParamValue::StringArray(vs) = &self.value {
            return Some(vs.clone());
        }
        fn render<T: ToString>(vs: Vec<T>) -> Vec<String> {
            vs.into_iter().map(|v| v.to_string()).collect()
        }
        self.as_u64_vec()
            .map(render)
            .or_else(|| self.as_i64_vec().map(render))
            .or_else(|| self.as_f64_vec().map(render))
    }
}

fn widen<T: Copy + Into<U>, U>(values: &[T]) -> Vec<U> {
    values.iter().map(|v| (*v).into()).collect()
}

// =============================================================================
// Encoding helpers
// =============================================================================

#[inline]
fn write_signed(buf: &mut RawBuffer, value: impl Into<i64>) -> Result<()> {
    varint::write_signed(buf, EncodeType::Varint, value.into())
}

#[inline]
fn write_unsigned(buf: &mut RawBuffer, value: impl Into<u64>) -> Result<()> {
    varint::write_unsigned(buf, EncodeType::Varint, value.into())
}

fn write_string(buf: &mut RawBuffer, value: &str) -> Result<()> {
    varint::write_unsigned(buf, EncodeType::LengthDelimited, value.len() as u64)?;
    buf.append(value.as_bytes())
}

fn write_array<T>(
    buf: &mut RawBuffer,
    values: &[T],
    mut write: impl FnMut(&mut RawBuffer, &T) -> Result<()>,
) -> Result<()> {
    varint::write_unsigned(buf, EncodeType::Varint, values.len() as u64)?;
    values.iter().try_for_each(|v| write(buf, v))
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one parameter starting at `*offset`, advancing past it
pub fn decode_param(data: &[u8], offset: &mut usize) -> Result<EncodedParam> {
    let key = read_string(data, offset, "param key")?;
    let type_byte = *data
        .get(*offset)
        .ok_or(ProtocolError::too_short(*offset + 1, data.len()))?;
    *offset += 1;
    let kind = ParamValueType::unpack(type_byte)?;

    let value = if kind.is_array {
        decode_array(data, offset, kind.value_type)?
    } else {
        decode_scalar(data, offset, kind.value_type)?
    };
    Ok(EncodedParam { key, value })
}

fn decode_scalar(data: &[u8], offset: &mut usize, value_type: ValueType) -> Result<ParamValue> {
    Ok(match value_type {
        ValueType::Bool => ParamValue::Bool(read_signed(data, offset)? != 0),
        ValueType::Int8 => ParamValue::Int8(read_narrow(data, offset, "int8")?),
        ValueType::Int16 => ParamValue::Int16(read_narrow(data, offset, "int16")?),
        ValueType::Int32 => ParamValue::Int32(read_narrow(data, offset, "int32")?),
        ValueType::Int64 => ParamValue::Int64(read_signed(data, offset)?),
        ValueType::Uint8 => ParamValue::Uint8(read_narrow_unsigned(data, offset, "uint8")?),
        ValueType::Uint16 => ParamValue::Uint16(read_narrow_unsigned(data, offset, "uint16")?),
        ValueType::Uint32 => ParamValue::Uint32(read_narrow_unsigned(data, offset, "uint32")?),
        ValueType::Uint64 => ParamValue::Uint64(read_unsigned(data, offset)?),
        ValueType::Float => ParamValue::Float(f32::from_le_bytes(read_fixed(data, offset)?)),
        ValueType::Double => ParamValue::Double(f64::from_le_bytes(read_fixed(data, offset)?)),
        ValueType::String => ParamValue::String(read_string(data, offset, "string value")?),
        ValueType::Unknown => return Err(ProtocolError::InvalidValueType(0)),
    })
}

fn decode_array(data: &[u8], offset: &mut usize, value_type: ValueType) -> Result<ParamValue> {
    let count = usize::try_from(read_unsigned(data, offset)?)
        .map_err(|_| ProtocolError::InvalidVarint(*offset))?;
    if count > MAX_ARRAY_SIZE {
        return Err(ProtocolError::ArrayTooLarge {
            count,
            max: MAX_ARRAY_SIZE,
        });
    }

    Ok(match value_type {
        ValueType::Bool => {
            ParamValue::BoolArray(read_array(data, offset, count, |d, o| {
                read_signed(d, o).map(|v| v != 0)
            })?)
        }
        ValueType::Int8 => ParamValue::Int8Array(read_array(data, offset, count, |d, o| {
            read_narrow(d, o, "int8")
        })?),
        ValueType::Int16 => ParamValue::Int16Array(read_array(data, offset, count, |d, o| {
            read_narrow(d, o, "int16")
        })?),
        ValueType::Int32 => ParamValue::Int32Array(read_array(data, offset, count, |d, o| {
            read_narrow(d, o, "int32")
        })?),
        ValueType::Int64 => ParamValue::Int64Array(read_array(data, offset, count, read_signed)?),
        ValueType::Uint8 => ParamValue::Uint8Array(read_array(data, offset, count, |d, o| {
            read_narrow_unsigned(d, o, "uint8")
        })?),
        ValueType::Uint16 => ParamValue::Uint16Array(read_array(data, offset, count, |d, o| {
            read_narrow_unsigned(d, o, "uint16")
        })?),
        ValueType::Uint32 => ParamValue::Uint32Array(read_array(data, offset, count, |d, o| {
            read_narrow_unsigned(d, o, "uint32")
        })?),
        ValueType::Uint64 => {
            ParamValue::Uint64Array(read_array(data, offset, count, read_unsigned)?)
        }
        ValueType::Float => ParamValue::FloatArray(read_array(data, offset, count, |d, o| {
            read_fixed(d, o).map(f32::from_le_bytes)
        })?),
        ValueType::Double => ParamValue::DoubleArray(read_array(data, offset, count, |d, o| {
            read_fixed(d, o).map(f64::from_le_bytes)
        })?),
        ValueType::String => ParamValue::StringArray(read_array(data, offset, count, |d, o| {
            read_string(d, o, "string value")
        })?),
        ValueType::Unknown => return Err(ProtocolError::InvalidValueType(0)),
    })
}

fn read_array<T>(
    data: &[u8],
    offset: &mut usize,
    count: usize,
    mut read: impl FnMut(&[u8], &mut usize) -> Result<T>,
) -> Result<Vec<T>> {
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(read(data, offset)?);
    }
    Ok(items)
}

fn read_signed(data: &[u8], offset: &mut usize) -> Result<i64> {
    varint::read_signed(data, offset).map(|(_, v)| v)
}

fn read_unsigned(data: &[u8], offset: &mut usize) -> Result<u64> {
    varint::read_unsigned(data, offset).map(|(_, v)| v)
}

fn read_narrow<T: TryFrom<i64>>(
    data: &[u8],
    offset: &mut usize,
    target: &'static str,
) -> Result<T> {
    let value = read_signed(data, offset)?;
    T::try_from(value).map_err(|_| ProtocolError::out_of_range(value, target))
}

fn read_narrow_unsigned<T: TryFrom<u64>>(
    data: &[u8],
    offset: &mut usize,
    target: &'static str,
) -> Result<T> {
    let value = read_unsigned(data, offset)?;
    T::try_from(value).map_err(|_| ProtocolError::out_of_range(value, target))
}

fn read_fixed<const N: usize>(data: &[u8], offset: &mut usize) -> Result<[u8; N]> {
    let end = *offset + N;
    let bytes = data
        .get(*offset..end)
        .ok_or(ProtocolError::too_short(end, data.len()))?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    *offset = end;
    Ok(out)
}

fn read_string(data: &[u8], offset: &mut usize, what: &'static str) -> Result<String> {
    let start = *offset;
    let len = usize::try_from(read_unsigned(data, offset)?)
        .map_err(|_| ProtocolError::InvalidVarint(start))?;
    let end = offset
        .checked_add(len)
        .ok_or(ProtocolError::InvalidVarint(start))?;
    let bytes = data
        .get(*offset..end)
        .ok_or(ProtocolError::too_short(end, data.len()))?;
    let value = std::str::from_utf8(bytes)
        .map_err(|_| ProtocolError::InvalidUtf8(what))?
        .to_owned();
    *offset = end;
    Ok(value)
}
