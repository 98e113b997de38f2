//! Fixed note timestamp format.
//!
//! # Invariants
//! - Accepted values are exactly `DD/MM/YYYY HH:MM:SS` with two-digit
//!   fields and a real calendar date.

use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// `chrono` pattern for the note timestamp format.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

static TIMESTAMP_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}$").expect("valid timestamp regex")
});

/// Returns whether `value` is a valid note timestamp.
///
/// The regex pins the zero-padded shape (chrono alone accepts `1/2/2024`);
/// chrono then rejects impossible dates such as `31/02/2024`.
pub fn is_valid_timestamp(value: &str) -> bool {
    TIMESTAMP_SHAPE_RE.is_match(value)
        && NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).is_ok()
}

/// Current local time in the note timestamp format.
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::{is_valid_timestamp, now_timestamp};

    #[test]
    fn accepts_fixed_format() {
        assert!(is_valid_timestamp("01/01/2024 00:00:00"));
        assert!(is_valid_timestamp("29/02/2024 23:59:59"));
    }

    #[test]
    fn rejects_other_separators_and_shapes() {
        assert!(!is_valid_timestamp("31-12-2024 10:00:00"));
        assert!(!is_valid_timestamp("1/1/2024 00:00:00"));
        assert!(!is_valid_timestamp("2024/12/31 10:00:00"));
        assert!(!is_valid_timestamp("31/12/2024"));
        assert!(!is_valid_timestamp(" 31/12/2024 10:00:00"));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(!is_valid_timestamp("31/02/2024 10:00:00"));
        assert!(!is_valid_timestamp("10/10/2024 25:00:00"));
    }

    #[test]
    fn now_is_valid() {
        assert!(is_valid_timestamp(&now_timestamp()));
    }
}
