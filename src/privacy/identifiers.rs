use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;
use crate::types::Result;

/// Maximum length of a district or subject identifier
pub const MAX_IDENTIFIER_LEN: usize = 64;

// Letters or digits first, then a small set of punctuation seen in
// district and subject names ("Red Deer", "St. Albert", "Career & Tech").
static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} .,'&()/\-]*$").unwrap()
});

fn check_identifier(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", kind)));
    }
    if value.trim() != value {
        return Err(Error::InvalidInput(format!(
            "{} '{}' has leading or trailing whitespace",
            kind, value
        )));
    }
    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(Error::InvalidInput(format!(
            "{} exceeds {} characters",
            kind, MAX_IDENTIFIER_LEN
        )));
    }
    if !IDENTIFIER_PATTERN.is_match(value) {
        return Err(Error::InvalidInput(format!(
            "{} '{}' contains unsupported characters",
            kind, value
        )));
    }
    Ok(())
}

/// Validate a district identifier
pub fn check_district(district: &str) -> Result<()> {
    check_identifier("District", district)
}

/// Validate a subject identifier
pub fn check_subject(subject: &str) -> Result<()> {
    check_identifier("Subject", subject)
}
