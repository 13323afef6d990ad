//! Numeric validation functions

/// Parses a value as a finite number.
///
/// Surrounding whitespace is ignored; `NaN` and infinities are rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Validates that a value is a finite number
pub fn is_number(value: &str) -> bool {
    parse_number(value).is_some()
}

/// Validates that a value is a number without a fractional part
pub fn is_integer(value: &str) -> bool {
    parse_number(value).is_some_and(|n| n.fract() == 0.0)
}

/// Validates minimum value; a non-numeric value or bound never satisfies it
pub fn is_at_least(value: &str, min: &str) -> bool {
    match (parse_number(value), parse_number(min)) {
        (Some(value), Some(min)) => value >= min,
        _ => false,
    }
}

/// Validates maximum value; a non-numeric value or bound never satisfies it
pub fn is_at_most(value: &str, max: &str) -> bool {
    match (parse_number(value), parse_number(max)) {
        (Some(value), Some(max)) => value <= max,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number() {
        assert!(is_number("42"));
        assert!(is_number("-3.5"));
        assert!(is_number(" 1e3 "));
        assert!(!is_number("abc"));
        assert!(!is_number("12abc"));
        assert!(!is_number("NaN"));
        assert!(!is_number("inf"));
    }

    #[test]
    fn test_integer() {
        assert!(is_integer("10"));
        assert!(is_integer("-4"));
        assert!(is_integer("2.0"));
        assert!(!is_integer("2.5"));
        assert!(!is_integer("two"));
    }

    #[test]
    fn test_min_validation() {
        assert!(is_at_least("10", "5"));
        assert!(is_at_least("5", "5"));
        assert!(!is_at_least("3", "5"));
        assert!(is_at_least("18.5", "18"));
        assert!(!is_at_least("abc", "5"));
        assert!(!is_at_least("10", "five"));
    }

    #[test]
    fn test_max_validation() {
        assert!(is_at_most("5", "10"));
        assert!(is_at_most("10", "10"));
        assert!(!is_at_most("15", "10"));
        assert!(!is_at_most("100.1", "100"));
    }
}
