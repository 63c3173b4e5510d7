/// Application Error Handling
///
/// Every failure inside the service is raised as a typed `AppError` and
/// translated exactly once, at the HTTP boundary, into the uniform envelope
/// `{ statusCode, success: false, message, errorId }`.
///
/// Authentication failures carry an internal reason for logging, but the
/// response never reveals it: all reasons fold into one of two fixed messages.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::store::StoreError;

/// Public message for every rejected or missing token.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized request";
/// Public message for a failed login, whether the user exists or not.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid user credentials";

// ============================================================================
// DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
    MissingLoginIdentifier,
    MissingFile(String),
    UploadFailed(String),
    InvalidOldPassword,
    MalformedBody(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {})", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::MissingLoginIdentifier => write!(f, "username or email is required"),
            ValidationError::MissingFile(field) => write!(f, "{} file is required", field),
            ValidationError::UploadFailed(field) => write!(f, "{} upload failed", field),
            ValidationError::InvalidOldPassword => write!(f, "Invalid old password"),
            ValidationError::MalformedBody(reason) => write!(f, "Malformed request body: {}", reason),
        }
    }
}

impl StdError for ValidationError {}

/// Why an authentication attempt was rejected. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    MissingToken,
    TokenExpired,
    TokenInvalid,
    RefreshTokenMismatch,
    UnknownSubject,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenInvalid => write!(f, "Invalid token"),
            AuthError::RefreshTokenMismatch => {
                write!(f, "Refresh token does not match the stored session")
            }
            AuthError::UnknownSubject => write!(f, "Token subject no longer exists"),
        }
    }
}

impl StdError for AuthError {}

// ============================================================================
// UNIFIED APPLICATION ERROR TYPE
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Conflict(String),
    Auth(AuthError),
    NotFound(String),
    Database(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => AppError::Conflict(
                "User with given email or username already exists".to_string(),
            ),
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

// ============================================================================
// HTTP RESPONSE MAPPING
// ============================================================================

/// Error envelope returned to clients
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub error_id: String,
}

impl AppError {
    /// The one place errors become a status and a client-visible message.
    pub fn classify(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                INVALID_CREDENTIALS_MESSAGE.to_string(),
            ),
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Database(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Conflict(msg) => {
                tracing::warn!(error_id = error_id, error = %msg, "Duplicate entry attempt");
            }
            AppError::Auth(reason) => {
                tracing::warn!(error_id = error_id, reason = %reason, "Authentication rejected");
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_id = error_id, error = %msg, "Resource not found");
            }
            AppError::Database(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Database error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let (status, message) = self.classify();
        HttpResponse::build(status).json(ErrorResponse {
            status_code: status.as_u16(),
            success: false,
            message,
            error_id,
        })
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}
