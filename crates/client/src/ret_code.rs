//! Integer status codes returned by every write
//!
//! Zero is success, positive values are warnings (the event was sent but
//! some parameters were dropped or truncated), negative values mean nothing
//! was sent.

pub const SUCCESS: i32 = 0;

// Warnings
pub const ERR_KEY_NAME_INVALID: i32 = 1;
pub const ERR_VALUE_LENGTH_TOO_LONG: i32 = 2;
pub const ERR_KEY_NUMBER_TOO_MUCH: i32 = 3;
pub const ERR_ARRAY_TOO_MUCH: i32 = 4;
pub const ERR_VALUE_INVALID: i32 = 5;
pub const ERR_ENCODE_VALUE_FAILED: i32 = 6;

// Fatal
pub const ERR_DOMAIN_NAME_INVALID: i32 = -1;
pub const ERR_EVENT_NAME_INVALID: i32 = -2;
pub const ERR_DOES_NOT_INIT: i32 = -3;
pub const ERR_OVER_SIZE: i32 = -4;
pub const ERR_SEND_FAIL: i32 = -5;
pub const ERR_WRITE_IN_HIGH_FREQ: i32 = -6;
pub const ERR_DOMAIN_MASKED: i32 = -7;
pub const ERR_EMPTY_EVENT: i32 = -8;
pub const ERR_ENCODE_FAILED: i32 = -9;
pub const ERR_TYPE_INVALID: i32 = -10;

#[inline]
pub const fn is_success(code: i32) -> bool {
    code == SUCCESS
}

#[inline]
pub const fn is_warning(code: i32) -> bool {
    code > SUCCESS
}

#[inline]
pub const fn is_fatal(code: i32) -> bool {
    code < SUCCESS
}

/// Combine two outcomes: fatal beats warning beats success
///
/// Between two codes of the same class the earlier one is kept.
pub const fn fold(current: i32, next: i32) -> i32 {
    if is_fatal(current) {
        current
    } else if is_fatal(next) {
        next
    } else if is_warning(current) {
        current
    } else {
        next
    }
}

/// Human-readable description of a status code
pub fn explain(code: i32) -> &'static str {
    match code {
        SUCCESS => "success",
        ERR_KEY_NAME_INVALID => "parameter key is invalid, parameter dropped",
        ERR_VALUE_LENGTH_TOO_LONG => "string value too long, truncated",
        ERR_KEY_NUMBER_TOO_MUCH => "too many parameters, extra ones dropped",
        ERR_ARRAY_TOO_MUCH => "array too long, truncated",
        ERR_VALUE_INVALID => "parameter value is invalid, parameter dropped",
        ERR_ENCODE_VALUE_FAILED => "parameter could not be encoded, parameter dropped",
        ERR_DOMAIN_NAME_INVALID => "domain is invalid",
        ERR_EVENT_NAME_INVALID => "event name is invalid",
        ERR_DOES_NOT_INIT => "socket could not be created",
        ERR_OVER_SIZE => "event exceeds the maximum record size",
        ERR_SEND_FAIL => "event could not be sent",
        ERR_WRITE_IN_HIGH_FREQ => "write frequency too high, event suppressed",
        ERR_DOMAIN_MASKED => "domain is masked, event dropped",
        ERR_EMPTY_EVENT => "event record is empty",
        ERR_ENCODE_FAILED => "event header could not be encoded",
        ERR_TYPE_INVALID => "event type is invalid",
        _ => "unknown status code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert!(is_success(SUCCESS));
        assert!(is_warning(ERR_ARRAY_TOO_MUCH));
        assert!(is_fatal(ERR_SEND_FAIL));
        assert!(!is_fatal(ERR_ENCODE_VALUE_FAILED));
    }

    #[test]
    fn test_fold_precedence() {
        assert_eq!(fold(SUCCESS, SUCCESS), SUCCESS);
        assert_eq!(fold(SUCCESS, ERR_ARRAY_TOO_MUCH), ERR_ARRAY_TOO_MUCH);
        assert_eq!(fold(ERR_ARRAY_TOO_MUCH, SUCCESS), ERR_ARRAY_TOO_MUCH);
        assert_eq!(fold(ERR_KEY_NAME_INVALID, ERR_ARRAY_TOO_MUCH), ERR_KEY_NAME_INVALID);
        assert_eq!(fold(ERR_ARRAY_TOO_MUCH, ERR_SEND_FAIL), ERR_SEND_FAIL);
        assert_eq!(fold(ERR_SEND_FAIL, ERR_ARRAY_TOO_MUCH), ERR_SEND_FAIL);
        assert_eq!(fold(ERR_SEND_FAIL, ERR_OVER_SIZE), ERR_SEND_FAIL);
    }

    #[test]
    fn test_every_code_explained() {
        for code in -10..=6 {
            assert_ne!(explain(code), "unknown status code", "code {code}");
        }
        assert_eq!(explain(42), "unknown status code");
    }
}
