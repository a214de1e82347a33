//! Parameter value types
//!
//! `ValueType` is the 4-bit type code carried in every parameter's type byte.
//! `ParamValue` is the typed value itself, one variant per scalar and array
//! form.

use crate::error::ProtocolError;
use crate::Result;

/// Wire type code of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ValueType {
    #[default]
    Unknown = 0,
    Bool = 1,
    Int8 = 2,
    Uint8 = 3,
    Int16 = 4,
    Uint16 = 5,
    Int32 = 6,
    Uint32 = 7,
    Int64 = 8,
    Uint64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
}

impl ValueType {
    /// Parse a type code, rejecting codes above 12
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Unknown,
            1 => Self::Bool,
            2 => Self::Int8,
            3 => Self::Uint8,
            4 => Self::Int16,
            5 => Self::Uint16,
            6 => Self::Int32,
            7 => Self::Uint32,
            8 => Self::Int64,
            9 => Self::Uint64,
            10 => Self::Float,
            11 => Self::Double,
            12 => Self::String,
            other => return Err(ProtocolError::InvalidValueType(other)),
        })
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// In-memory width of one element, 0 for bool and strings
    pub const fn byte_width(self) -> u8 {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float => 4,
            Self::Int64 | Self::Uint64 | Self::Double => 8,
            Self::Unknown | Self::Bool | Self::String => 0,
        }
    }

    /// Width hint stored in bits 5-7 of the type byte (log2 of the width)
    pub const fn byte_cnt_hint(self) -> u8 {
        match self.byte_width() {
            2 => 1,
            4 => 2,
            8 => 3,
            _ => 0,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const IS_ARRAY_BIT: u8 = 0b0000_0001;
const VALUE_TYPE_SHIFT: u8 = 1;
const VALUE_TYPE_MASK: u8 = 0b0000_1111;
const BYTE_CNT_SHIFT: u8 = 5;
const BYTE_CNT_MASK: u8 = 0b0000_0111;

/// Decomposed parameter type byte
///
/// ```text
/// bit 0:   is_array
/// bit 1-4: value type
/// bit 5-7: byte count hint
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamValueType {
    pub is_array: bool,
    pub value_type: ValueType,
    pub value_byte_cnt: u8,
}

impl ParamValueType {
    pub fn new(value_type: ValueType, is_array: bool) -> Self {
        Self {
            is_array,
            value_type,
            value_byte_cnt: value_type.byte_cnt_hint(),
        }
    }

    pub fn pack(self) -> u8 {
        u8::from(self.is_array)
            | ((self.value_type.as_u8() & VALUE_TYPE_MASK) << VALUE_TYPE_SHIFT)
            | ((self.value_byte_cnt & BYTE_CNT_MASK) << BYTE_CNT_SHIFT)
    }

    pub fn unpack(byte: u8) -> Result<Self> {
        Ok(Self {
            is_array: byte & IS_ARRAY_BIT != 0,
            value_type: ValueType::from_u8((byte >> VALUE_TYPE_SHIFT) & VALUE_TYPE_MASK)?,
            value_byte_cnt: (byte >> BYTE_CNT_SHIFT) & BYTE_CNT_MASK,
        })
    }
}

/// A typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Float(f32),
    Double(f64),
    String(String),
    BoolArray(Vec<bool>),
    Int8Array(Vec<i8>),
    Uint8Array(Vec<u8>),
    Int16Array(Vec<i16>),
    Uint16Array(Vec<u16>),
    Int32Array(Vec<i32>),
    Uint32Array(Vec<u32>),
    Int64Array(Vec<i64>),
    Uint64Array(Vec<u64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl ParamValue {
    /// Element type, the same for a scalar and its array form
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) | Self::BoolArray(_) => ValueType::Bool,
            Self::Int8(_) | Self::Int8Array(_) => ValueType::Int8,
            Self::Uint8(_) | Self::Uint8Array(_) => ValueType::Uint8,
            Self::Int16(_) | Self::Int16Array(_) => ValueType::Int16,
            Self::Uint16(_) | Self::Uint16Array(_) => ValueType::Uint16,
            Self::Int32(_) | Self::Int32Array(_) => ValueType::Int32,
            Self::Uint32(_) | Self::Uint32Array(_) => ValueType::Uint32,
            Self::Int64(_) | Self::Int64Array(_) => ValueType::Int64,
            Self::Uint64(_) | Self::Uint64Array(_) => ValueType::Uint64,
            Self::Float(_) | Self::FloatArray(_) => ValueType::Float,
            Self::Double(_) | Self::DoubleArray(_) => ValueType::Double,
            Self::String(_) | Self::StringArray(_) => ValueType::String,
        }
    }

    /// Element count for arrays, `None` for scalars
    pub fn array_len(&self) -> Option<usize> {
        Some(match self {
            Self::BoolArray(v) => v.len(),
            Self::Int8Array(v) => v.len(),
            Self::Uint8Array(v) => v.len(),
            Self::Int16Array(v) => v.len(),
            Self::Uint16Array(v) => v.len(),
            Self::Int32Array(v) => v.len(),
            Self::Uint32Array(v) => v.len(),
            Self::Int64Array(v) => v.len(),
            Self::Uint64Array(v) => v.len(),
            Self::FloatArray(v) => v.len(),
            Self::DoubleArray(v) => v.len(),
            Self::StringArray(v) => v.len(),
            _ => return None,
        })
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.array_len().is_some()
    }

    pub fn param_value_type(&self) -> ParamValueType {
        ParamValueType::new(self.value_type(), self.is_array())
    }

    /// Cut an array down to `max` elements; returns true if anything was dropped
    pub fn truncate_array(&mut self, max: usize) -> bool {
        let before = self.array_len();
        match self {
            Self::BoolArray(v) => v.truncate(max),
            Self::Int8Array(v) => v.truncate(max),
            Self::Uint8Array(v) => v.truncate(max),
            Self::Int16Array(v) => v.truncate(max),
            Self::Uint16Array(v) => v.truncate(max),
            Self::Int32Array(v) => v.truncate(max),
            Self::Uint32Array(v) => v.truncate(max),
            Self::Int64Array(v) => v.truncate(max),
            Self::Uint64Array(v) => v.truncate(max),
            Self::FloatArray(v) => v.truncate(max),
            Self::DoubleArray(v) => v.truncate(max),
            Self::StringArray(v) => v.truncate(max),
            _ => {}
        }
        before != self.array_len()
    }

    /// Cut every string (scalar or array element) down to `max` bytes
    ///
    /// Cuts land on a char boundary. Returns true if any string was shortened.
    pub fn truncate_strings(&mut self, max: usize) -> bool {
        match self {
            Self::String(s) => truncate_at_boundary(s, max),
            Self::StringArray(items) => items
                .iter_mut()
                .fold(false, |cut, s| truncate_at_boundary(s, max) || cut),
            _ => false,
        }
    }
}

fn truncate_at_boundary(s: &mut String, max: usize) -> bool {
    if s.len() <= max {
        return false;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
    true
}

macro_rules! impl_from_value {
    ($($ty:ty => $scalar:ident, $array:ident;)*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::$scalar(value)
                }
            }

            impl From<Vec<$ty>> for ParamValue {
                fn from(value: Vec<$ty>) -> Self {
                    Self::$array(value)
                }
            }

            impl From<&[$ty]> for ParamValue {
                fn from(value: &[$ty]) -> Self {
                    Self::$array(value.to_vec())
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool, BoolArray;
    i8 => Int8, Int8Array;
    u8 => Uint8, Uint8Array;
    i16 => Int16, Int16Array;
    u16 => Uint16, Uint16Array;
    i32 => Int32, Int32Array;
    u32 => Uint32, Uint32Array;
    i64 => Int64, Int64Array;
    u64 => Uint64, Uint64Array;
    f32 => Float, FloatArray;
    f64 => Double, DoubleArray;
    String => String, StringArray;
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        Self::StringArray(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for ParamValue {
    fn from(value: &[&str]) -> Self {
        Self::StringArray(value.iter().map(|s| (*s).to_owned()).collect())
    }
}
