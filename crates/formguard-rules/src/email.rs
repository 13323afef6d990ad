//! Email validation functions

use once_cell::sync::Lazy;
use regex::Regex;

// local@domain.tld: no whitespace, exactly one '@', a '.' somewhere after it
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Validates the `local@domain.tld` shape.
///
/// This is a shape check, not an RFC 5322 parser: it rejects embedded
/// whitespace, a missing or repeated `@`, and a domain without a dot.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("user@example.com")]
    #[case("test.user@example.co.uk")]
    #[case("user+tag@example.com")]
    #[case("a@b.co")]
    fn test_valid_emails(#[case] email: &str) {
        assert!(is_valid_email(email));
    }

    #[rstest]
    #[case("")]
    #[case("bad")]
    #[case("user@")]
    #[case("@example.com")]
    #[case("user@@example.com")]
    #[case("user@example")]
    #[case("us er@example.com")]
    #[case("user@exa mple.com")]
    fn test_invalid_emails(#[case] email: &str) {
        assert!(!is_valid_email(email));
    }
}
