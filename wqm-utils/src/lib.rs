//! Shared utility functions for WQM crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// Canonical date format for every dated key held in memory.
    pub const ISO_FORMAT: &str = "%Y-%m-%d";

    /// Formats accepted on input, tried in order.
    const INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(ISO_FORMAT).to_string()
    }

    /// Normalize a date key to fixed-width "YYYY-MM-DD".
    ///
    /// Lexicographic order of dated keys is only chronological when every key
    /// has the same width, so published keys like `2024/5/1` or `20240501` are
    /// rewritten. Keys that do not parse as a date are returned verbatim.
    pub fn normalize_date_key(raw: &str) -> String {
        let trimmed = raw.trim();
        // Drop a trailing time component ("2024-05-01 10:30").
        let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
        for format in INPUT_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
                return format_date(&date);
            }
        }
        trimmed.to_string()
    }

}

/// Number parsing for published tables and payloads
pub mod numbers {
    /// Placeholder the usage tables use for "no volume".
    pub const ZERO_PLACEHOLDER: &str = "-00";

    /// Parse a locale-formatted number such as `"1,234"` or the `-00`
    /// placeholder.
    ///
    /// Thousands separators are stripped and every `-00` is rewritten to `0`
    /// before parsing. Returns `None` when nothing numeric is left.
    pub fn parse_locale_number(raw: &str) -> Option<f64> {
        let cleaned = raw.trim().replace(',', "").replace(ZERO_PLACEHOLDER, "0");
        if cleaned.is_empty() {
            return None;
        }
        cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Parse a measurement value that may arrive as a string with stray
    /// whitespace or qualifiers like `"<0.01"`.
    ///
    /// Leading comparison qualifiers are dropped; anything else unparseable
    /// is treated as absent.
    pub fn parse_measurement(raw: &str) -> Option<f64> {
        let trimmed = raw.trim().trim_start_matches(['<', '>', '≦', '≧']).trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_locale_number() {
            assert_eq!(parse_locale_number("1,234"), Some(1234.0));
            assert_eq!(parse_locale_number("12,345,678.5"), Some(12345678.5));
            assert_eq!(parse_locale_number("500"), Some(500.0));
            assert_eq!(parse_locale_number("-00"), Some(0.0));
            assert_eq!(parse_locale_number(" 7 "), Some(7.0));
        }

        #[test]
        fn test_parse_locale_number_absent() {
            assert_eq!(parse_locale_number(""), None);
            assert_eq!(parse_locale_number("n/a"), None);
            assert_eq!(parse_locale_number("NaN"), None);
        }

        #[test]
        fn test_parse_measurement() {
            assert_eq!(parse_measurement("7.6"), Some(7.6));
            assert_eq!(parse_measurement("<0.01"), Some(0.01));
            assert_eq!(parse_measurement("ND"), None);
            assert_eq!(parse_measurement("  "), None);
        }
    }
}
