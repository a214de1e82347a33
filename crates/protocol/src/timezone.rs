//! Time-zone index table
//!
//! The header stores the writer's UTC offset as a one-byte index into a fixed
//! table of `+HHMM` strings.

use chrono::Local;

/// Every offset the header can carry, indexed by the stored byte
pub const ALL_TIME_ZONES: [&str; 38] = [
    "-0100", "-0200", "-0300", "-0330", "-0400", "-0500", "-0600", "-0700", "-0800", "-0900",
    "-0930", "-1000", "-1100", "-1200", "+0000", "+0100", "+0200", "+0300", "+0330", "+0400",
    "+0430", "+0500", "+0530", "+0545", "+0600", "+0630", "+0700", "+0800", "+0845", "+0900",
    "+0930", "+1000", "+1030", "+1100", "+1200", "+1245", "+1300", "+1400",
];

/// Index of `+0000`, used for anything not in the table
pub const DEFAULT_TIME_ZONE_INDEX: u8 = 14;

/// Map a `+HHMM` string to its table index
pub fn parse_time_zone(tz: &str) -> u8 {
    ALL_TIME_ZONES
        .iter()
        .position(|candidate| *candidate == tz)
        .and_then(|pos| u8::try_from(pos).ok())
        .unwrap_or(DEFAULT_TIME_ZONE_INDEX)
}

/// Map a table index back to its `+HHMM` string
pub fn time_zone_from_index(index: u8) -> &'static str {
    ALL_TIME_ZONES
        .get(usize::from(index))
        .copied()
        .unwrap_or(ALL_TIME_ZONES[usize::from(DEFAULT_TIME_ZONE_INDEX)])
}

/// Current local offset formatted as `+HHMM`
pub fn local_time_zone() -> String {
    Local::now().format("%z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_offsets() {
        assert_eq!(parse_time_zone("-0100"), 0);
        assert_eq!(parse_time_zone("+0000"), DEFAULT_TIME_ZONE_INDEX);
        assert_eq!(parse_time_zone("+0100"), 15);
        assert_eq!(parse_time_zone("+0800"), 27);
        assert_eq!(parse_time_zone("+1400"), 37);
    }

    #[test]
    fn test_parse_unknown_falls_back_to_utc() {
        assert_eq!(parse_time_zone("+0123"), DEFAULT_TIME_ZONE_INDEX);
        assert_eq!(parse_time_zone(""), DEFAULT_TIME_ZONE_INDEX);
    }

    #[test]
    fn test_index_lookup() {
        assert_eq!(time_zone_from_index(15), "+0100");
        assert_eq!(time_zone_from_index(40), "+0000");
        for (index, tz) in ALL_TIME_ZONES.iter().enumerate() {
            assert_eq!(time_zone_from_index(index as u8), *tz);
        }
    }

    #[test]
    fn test_local_time_zone_shape() {
        let tz = local_time_zone();
        assert_eq!(tz.len(), 5);
        assert!(tz.starts_with('+') || tz.starts_with('-'));
    }
}
