//! Name validation and string escaping

use std::borrow::Cow;
use std::fmt::Write;

/// Check a domain, event name, or parameter key
///
/// Valid names are non-empty, at most `max_len` bytes, start with an ASCII
/// letter, and contain only ASCII letters, digits, and `_`.
pub fn is_valid_name(name: &str, max_len: usize) -> bool {
    let bytes = name.as_bytes();
    match bytes.first() {
        Some(first) if first.is_ascii_alphabetic() && bytes.len() <= max_len => bytes[1..]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'_'),
        _ => false,
    }
}

#[inline]
fn needs_escape(c: char) -> bool {
    c == '\\' || c == '"' || (c.is_ascii_control() && c != '\u{7f}')
}

/// Escape quotes, backslashes, and control characters
///
/// Borrows the input when nothing needs escaping.
pub fn escape_to_raw(input: &str) -> Cow<'_, str> {
    if !input.chars().any(needs_escape) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if needs_escape(c) => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Reverse `escape_to_raw`
///
/// Unknown escape sequences are kept as written.
pub fn unescape_raw(input: &str) -> Cow<'_, str> {
    if !input.contains('\\') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => out.push_str("\\u"),
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("KERNEL_VENDOR", 16));
        assert!(is_valid_name("a", 1));
        assert!(is_valid_name("Power_Key_2", 32));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_name("", 16));
        assert!(!is_valid_name("1ABC", 16));
        assert!(!is_valid_name("_ABC", 16));
        assert!(!is_valid_name("AB-C", 16));
        assert!(!is_valid_name("ABC DEF", 16));
        assert!(!is_valid_name("ABCDEFGHIJKLMNOPQ", 16));
        assert!(!is_valid_name("ÄBC", 16));
    }

    #[test]
    fn test_escape_borrowed_when_clean() {
        assert!(matches!(escape_to_raw("plain text"), Cow::Borrowed(_)));
        assert!(matches!(unescape_raw("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_newline_and_quote() {
        let raw = "line1\nsay \"hi\"";
        let escaped = escape_to_raw(raw);
        assert_eq!(escaped, "line1\\nsay \\\"hi\\\"");
        assert_eq!(unescape_raw(&escaped), raw);
    }

    #[test]
    fn test_escape_all_named_sequences() {
        let raw = "\\ \" \n \r \t \u{8} \u{c}";
        let escaped = escape_to_raw(raw);
        assert_eq!(escaped, "\\\\ \\\" \\n \\r \\t \\b \\f");
        assert_eq!(unescape_raw(&escaped), raw);
    }

    #[test]
    fn test_escape_other_controls_as_unicode() {
        let raw = "a\u{1}b\u{1f}";
        let escaped = escape_to_raw(raw);
        assert_eq!(escaped, "a\\u0001b\\u001f");
        assert_eq!(unescape_raw(&escaped), raw);
    }

    #[test]
    fn test_unescape_keeps_unknown_sequences() {
        assert_eq!(unescape_raw("a\\qb"), "a\\qb");
        assert_eq!(unescape_raw("trailing\\"), "trailing\\");
        assert_eq!(unescape_raw("\\u12"), "\\u12");
    }

    #[test]
    fn test_non_ascii_passes_through() {
        let raw = "温度 \"高\"";
        assert_eq!(unescape_raw(&escape_to_raw(raw)), raw);
    }
}
