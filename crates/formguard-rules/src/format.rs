//! Format validators: URLs, phone numbers, calendar dates

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?\(?[0-9]{1,4}\)?[-.]?[0-9]{2,4}[-.]?[0-9]{3,4}[-.]?[0-9]{0,6}$").unwrap()
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%d %B %Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Validates an absolute URL (scheme plus whatever that scheme requires)
pub fn is_valid_url(url_str: &str) -> bool {
    url::Url::parse(url_str).is_ok()
}

/// Validates a permissive international phone number.
///
/// Whitespace is stripped first, so `+44 20 7946 0958` and `(555) 123-4567`
/// are both accepted.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits) && PHONE_REGEX.is_match(&compact)
}

/// Parses a calendar date in any of the accepted formats
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Validates a calendar date
pub fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// `value` is a date no earlier than `min`; either side failing to parse fails
pub fn is_date_on_or_after(value: &str, min: &str) -> bool {
    match (parse_date(value), parse_date(min)) {
        (Some(date), Some(min)) => date >= min,
        _ => false,
    }
}

/// `value` is a date no later than `max`; either side failing to parse fails
pub fn is_date_on_or_before(value: &str, max: &str) -> bool {
    match (parse_date(value), parse_date(max)) {
        (Some(date), Some(max)) => date <= max,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://test.co.uk/path?q=1"));
        assert!(is_valid_url("ftp://files.example.com"));

        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("https://"));
    }

    #[rstest]
    #[case("+44 20 7946 0958")]
    #[case("(555) 123-4567")]
    #[case("555.123.4567")]
    #[case("+1-555-123-4567")]
    #[case("0612345678")]
    fn test_valid_phones(#[case] phone: &str) {
        assert!(is_valid_phone(phone));
    }

    #[rstest]
    #[case("12345")]
    #[case("phone")]
    #[case("555-CALL-NOW")]
    #[case("++1 555 123 4567")]
    fn test_invalid_phones(#[case] phone: &str) {
        assert!(!is_valid_phone(phone));
    }

    #[rstest]
    #[case("2024-02-29")]
    #[case("2024/01/15")]
    #[case("01/15/2024")]
    #[case("15.01.2024")]
    #[case("January 15, 2024")]
    #[case("2024-01-15T10:30:00Z")]
    #[case("2024-01-15T10:30")]
    fn test_valid_dates(#[case] date: &str) {
        assert!(is_valid_date(date));
    }

    #[rstest]
    #[case("2023-02-29")]
    #[case("2024-13-01")]
    #[case("tomorrow")]
    #[case("15/15/2024")]
    fn test_invalid_dates(#[case] date: &str) {
        assert!(!is_valid_date(date));
    }

    #[rstest]
    #[case("2024-06-01", "2024-01-01", true)]
    #[case("2024-01-01", "2024-01-01", true)]
    #[case("2023-12-31", "2024-01-01", false)]
    #[case("01/15/2024", "2024-01-01", true)]
    #[case("soon", "2024-01-01", false)]
    #[case("2024-06-01", "later", false)]
    fn test_date_lower_bound(#[case] value: &str, #[case] min: &str, #[case] expected: bool) {
        assert_eq!(is_date_on_or_after(value, min), expected);
    }

    #[test]
    fn test_date_upper_bound() {
        assert!(is_date_on_or_before("2024-12-31", "2024-12-31"));
        assert!(is_date_on_or_before("2024-01-15T10:30", "2024-12-31"));
        assert!(!is_date_on_or_before("2025-01-01", "2024-12-31"));
        assert!(!is_date_on_or_before("", "2024-12-31"));
    }
}
