/// Input validators for account data
/// Features:
/// 1. Required-field checks (present and non-blank)
/// 2. Email format and length validation, lowercased
/// 3. Username normalisation (lowercase) and charset validation
/// 4. Display-name sanitisation (no control characters)

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MAX_FULL_NAME_LENGTH: usize = 256;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-z0-9_.-]+$").unwrap();
}

/// Returns the trimmed value, or `EmptyField` when absent or blank.
pub fn require_field(value: Option<&str>, field: &str) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::EmptyField(field.to_string())),
    }
}

/// Validates email address
/// - Checks format using RFC 5322 simplified regex
/// - Verifies length constraints
/// - Returns it lowercased, so uniqueness and lookups ignore case
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) || trimmed.matches('@').count() != 1 {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_lowercase())
}

/// Validates and normalises a username to lowercase
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let normalized = username.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if normalized.chars().count() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort("username".to_string(), MIN_USERNAME_LENGTH));
    }

    if normalized.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH));
    }

    if !USERNAME_REGEX.is_match(&normalized) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(normalized)
}

/// Validates a display name
/// - Checks length constraints
/// - Rejects control characters and null bytes
pub fn is_valid_full_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("fullName".to_string()));
    }

    if trimmed.chars().count() > MAX_FULL_NAME_LENGTH {
        return Err(ValidationError::TooLong("fullName".to_string(), MAX_FULL_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("fullName".to_string()));
    }

    Ok(trimmed.to_string())
}
