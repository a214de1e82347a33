//! C ABI entry point
//!
//! Mirrors the struct-array write API exposed to C callers. Parameters arrive
//! as tagged unions; each is converted to an [`EncodedParam`] and the event is
//! handed to the global [`Writer`].

use std::ffi::{CStr, c_char, c_int, c_void};
use std::slice;

use sysevent_protocol::{EncodedParam, EventType, ParamValue};

use crate::controller::CallSite;
use crate::ret_code::{self, SUCCESS};
use crate::writer::Writer;

/// Bytes in a parameter name, including the terminating nul
///
/// Fixed by the C header layout, so C callers can pass keys of at most 32
/// bytes even though the Rust API accepts longer ones.
pub const PARAM_NAME_SIZE: usize = sysevent_protocol::MAX_EVENT_NAME_LENGTH + 1;

pub const TYPE_INVALID: c_int = 0;
pub const TYPE_BOOL: c_int = 1;
pub const TYPE_INT8: c_int = 2;
pub const TYPE_UINT8: c_int = 3;
pub const TYPE_INT16: c_int = 4;
pub const TYPE_UINT16: c_int = 5;
pub const TYPE_INT32: c_int = 6;
pub const TYPE_UINT32: c_int = 7;
pub const TYPE_INT64: c_int = 8;
pub const TYPE_UINT64: c_int = 9;
pub const TYPE_FLOAT: c_int = 10;
pub const TYPE_DOUBLE: c_int = 11;
pub const TYPE_STRING: c_int = 12;
pub const TYPE_BOOL_ARRAY: c_int = 13;
pub const TYPE_INT8_ARRAY: c_int = 14;
pub const TYPE_UINT8_ARRAY: c_int = 15;
pub const TYPE_INT16_ARRAY: c_int = 16;
pub const TYPE_UINT16_ARRAY: c_int = 17;
pub const TYPE_INT32_ARRAY: c_int = 18;
pub const TYPE_UINT32_ARRAY: c_int = 19;
pub const TYPE_INT64_ARRAY: c_int = 20;
pub const TYPE_UINT64_ARRAY: c_int = 21;
pub const TYPE_FLOAT_ARRAY: c_int = 22;
pub const TYPE_DOUBLE_ARRAY: c_int = 23;
pub const TYPE_STRING_ARRAY: c_int = 24;

/// Rate-control call site shared by all C callers
const C_CALL_SITE: CallSite<'static> = CallSite::new("SysEvent_Write", 0);

#[repr(C)]
#[derive(Clone, Copy)]
pub union SysEventParamValue {
    pub b: bool,
    pub i8: i8,
    pub ui8: u8,
    pub i16: i16,
    pub ui16: u16,
    pub i32: i32,
    pub ui32: u32,
    pub i64: i64,
    pub ui64: u64,
    pub f: f32,
    pub d: f64,
    pub s: *mut c_char,
    pub array: *mut c_void,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct SysEventParam {
    pub name: [c_char; PARAM_NAME_SIZE],
    pub param_type: c_int,
    pub value: SysEventParamValue,
    pub array_size: usize,
}

/// Write an event described by C strings and a parameter array
///
/// Returns a status code from [`ret_code`](crate::ret_code).
///
/// # Safety
///
/// `domain` and `name` must be null or point to nul-terminated strings.
/// `params` must be null or point to `size` initialized parameters, and every
/// string or array pointer inside them must be null or valid for the
/// declared type and `array_size`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn SysEvent_Write(
    domain: *const c_char,
    name: *const c_char,
    event_type: c_int,
    params: *const SysEventParam,
    size: usize,
) -> c_int {
    // SAFETY: forwarded caller contract
    unsafe { write_with(Writer::global(), domain, name, event_type, params, size) }
}

/// Same as [`SysEvent_Write`], exported under the name the C header declares
///
/// # Safety
///
/// Same contract as [`SysEvent_Write`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn OH_HiSysEvent_Write(
    domain: *const c_char,
    name: *const c_char,
    event_type: c_int,
    params: *const SysEventParam,
    size: usize,
) -> c_int {
    // SAFETY: forwarded caller contract
    unsafe { SysEvent_Write(domain, name, event_type, params, size) }
}

/// [`SysEvent_Write`] against an explicit writer
///
/// # Safety
///
/// Same contract as [`SysEvent_Write`].
pub unsafe fn write_with(
    writer: &Writer,
    domain: *const c_char,
    name: *const c_char,
    event_type: c_int,
    params: *const SysEventParam,
    size: usize,
) -> c_int {
    // SAFETY: caller guarantees null or nul-terminated
    let Some(domain) = (unsafe { c_str(domain) }) else {
        return ret_code::ERR_DOMAIN_NAME_INVALID;
    };
    // SAFETY: as above
    let Some(name) = (unsafe { c_str(name) }) else {
        return ret_code::ERR_EVENT_NAME_INVALID;
    };
    let Ok(event_type) = EventType::try_from(event_type) else {
        tracing::error!(domain = %domain, event = %name, event_type, "invalid event type");
        return ret_code::ERR_TYPE_INVALID;
    };

    let mut code = SUCCESS;
    let raw: &[SysEventParam] = if params.is_null() {
        if size > 0 {
            code = ret_code::ERR_VALUE_INVALID;
        }
        &[]
    } else {
        // SAFETY: caller guarantees `size` initialized parameters
        unsafe { slice::from_raw_parts(params, size) }
    };

    let mut converted = Vec::with_capacity(raw.len());
    for param in raw {
        // SAFETY: caller guarantees the union matches `param_type`
        match unsafe { convert(param) } {
            Ok(p) => converted.push(p),
            Err(c) => {
                tracing::debug!(param_type = param.param_type, code = c, "C parameter rejected");
                code = ret_code::fold(code, c);
            }
        }
    }

    let result = writer.write(&C_CALL_SITE, domain, name, event_type, converted);
    ret_code::fold(code, result)
}

unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and nul-terminated per caller contract
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn param_name(name: &[c_char; PARAM_NAME_SIZE]) -> Option<String> {
    let bytes: Vec<u8> = name.iter().map(|&c| c as u8).collect();
    let name = CStr::from_bytes_until_nul(&bytes).ok()?;
    name.to_str().ok().map(str::to_string)
}

/// Copy `len` elements from a C array; an empty array may be null
unsafe fn copy_array<T: Copy>(ptr: *const c_void, len: usize) -> Option<Vec<T>> {
    if len == 0 {
        return Some(Vec::new());
    }
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and valid for `len` elements per caller contract
    Some(unsafe { slice::from_raw_parts(ptr.cast::<T>(), len) }.to_vec())
}

unsafe fn convert(param: &SysEventParam) -> Result<EncodedParam, i32> {
    let key = param_name(&param.name).ok_or(ret_code::ERR_KEY_NAME_INVALID)?;
    let v = param.value;
    let len = param.array_size;
    let invalid = ret_code::ERR_VALUE_INVALID;

    // SAFETY: the active union field is selected by `param_type`
    let value = unsafe {
        match param.param_type {
            TYPE_BOOL => ParamValue::Bool(v.ui8 != 0),
            TYPE_INT8 => ParamValue::Int8(v.i8),
            TYPE_UINT8 => ParamValue::Uint8(v.ui8),
            TYPE_INT16 => ParamValue::Int16(v.i16),
            TYPE_UINT16 => ParamValue::Uint16(v.ui16),
            TYPE_INT32 => ParamValue::Int32(v.i32),
            TYPE_UINT32 => ParamValue::Uint32(v.ui32),
            TYPE_INT64 => ParamValue::Int64(v.i64),
            TYPE_UINT64 => ParamValue::Uint64(v.ui64),
            TYPE_FLOAT => ParamValue::Float(v.f),
            TYPE_DOUBLE => ParamValue::Double(v.d),
            TYPE_STRING => ParamValue::String(c_str(v.s).ok_or(invalid)?.to_string()),
            TYPE_BOOL_ARRAY => ParamValue::BoolArray(
                copy_array::<u8>(v.array, len)
                    .ok_or(invalid)?
                    .into_iter()
                    .map(|b| b != 0)
                    .collect(),
            ),
            TYPE_INT8_ARRAY => ParamValue::Int8Array(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_UINT8_ARRAY => ParamValue::Uint8Array(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_INT16_ARRAY => ParamValue::Int16Array(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_UINT16_ARRAY => ParamValue::Uint16Array(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_INT32_ARRAY => ParamValue::Int32Array(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_UINT32_ARRAY => ParamValue::Uint32Array(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_INT64_ARRAY => ParamValue::Int64Array(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_UINT64_ARRAY => ParamValue::Uint64Array(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_FLOAT_ARRAY => ParamValue::FloatArray(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_DOUBLE_ARRAY => ParamValue::DoubleArray(copy_array(v.array, len).ok_or(invalid)?),
            TYPE_STRING_ARRAY => {
                let ptrs = copy_array::<*const c_char>(v.array, len).ok_or(invalid)?;
                let items = ptrs
                    .into_iter()
                    .map(|p| c_str(p).map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or(invalid)?;
                ParamValue::StringArray(items)
            }
            _ => return Err(invalid),
        }
    };

    Ok(EncodedParam::new(key, value))
}

#[cfg(test)]
#[path = "ffi_test.rs"]
mod tests;
