/// Credential Verifier
///
/// Salted, one-way password hashing with bcrypt. Each call to `hash_password`
/// draws a new salt, so equal passwords never share a digest.

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

// bcrypt ignores everything past 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if:
/// - Password is blank or longer than bcrypt can represent
/// - Bcrypt hashing fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    validate_password(password)?;

    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// A wrong password is `Ok(false)`; only a corrupt stored hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "password".to_string(),
        )));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        )));
    }

    Ok(())
}
