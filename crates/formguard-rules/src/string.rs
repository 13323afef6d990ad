//! String validation functions

use once_cell::sync::Lazy;
use regex::Regex;

static ALPHA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").unwrap());
static ALPHANUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

/// Length in characters, not bytes
pub fn char_length(s: &str) -> usize {
    s.chars().count()
}

/// Validates minimum length; a non-numeric bound never satisfies it
pub fn has_min_length(s: &str, min: &str) -> bool {
    min.trim()
        .parse::<usize>()
        .is_ok_and(|min| char_length(s) >= min)
}

/// Validates maximum length; a non-numeric bound never satisfies it
pub fn has_max_length(s: &str, max: &str) -> bool {
    max.trim()
        .parse::<usize>()
        .is_ok_and(|max| char_length(s) <= max)
}

/// Compiles a regular expression source the way an HTML `pattern`
/// attribute reads it: anchored at both ends.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

/// Matches the whole value against a regular expression source.
///
/// Compiles on every call; callers checking many values should keep the
/// result of [`compile_pattern`]. Returns the compile error for an invalid
/// pattern so the caller can decide how to report it.
pub fn matches_pattern(value: &str, pattern: &str) -> Result<bool, regex::Error> {
    compile_pattern(pattern).map(|regex| regex.is_match(value))
}

/// Letters only (ASCII)
pub fn is_alpha(value: &str) -> bool {
    ALPHA_REGEX.is_match(value)
}

/// Letters and digits only (ASCII)
pub fn is_alphanumeric(value: &str) -> bool {
    ALPHANUMERIC_REGEX.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_validators() {
        assert!(has_min_length("hello", "3"));
        assert!(!has_min_length("hi", "3"));
        assert!(has_max_length("hello", "10"));
        assert!(!has_max_length("verylongstring", "5"));
        assert!(!has_min_length("hello", "three"));
    }

    #[test]
    fn test_length_counts_characters() {
        assert_eq!(char_length("héllo"), 5);
        assert!(has_max_length("日本語", "3"));
    }

    #[test]
    fn test_pattern_is_anchored() {
        assert_eq!(matches_pattern("abc", "[a-z]+").ok(), Some(true));
        assert_eq!(matches_pattern("abc1", "[a-z]+").ok(), Some(false));
        assert_eq!(matches_pattern("12345", r"\d{5}").ok(), Some(true));
        assert_eq!(matches_pattern("123456", r"\d{5}").ok(), Some(false));
    }

    #[test]
    fn test_pattern_alternation_stays_grouped() {
        assert_eq!(matches_pattern("cat", "cat|dog").ok(), Some(true));
        assert_eq!(matches_pattern("cats", "cat|dog").ok(), Some(false));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches_pattern("abc", "[a-").is_err());
    }

    #[test]
    fn test_character_classes() {
        assert!(is_alpha("Hello"));
        assert!(!is_alpha("Hello1"));
        assert!(!is_alpha("two words"));
        assert!(is_alphanumeric("abc123"));
        assert!(!is_alphanumeric("abc_123"));
    }
}
