/// JWT Claims structures
///
/// Access tokens carry the user's public identity so clients can render it
/// without another request; refresh tokens carry only the subject.
/// Every token gets a fresh `jti`, so two tokens minted for the same user in
/// the same second are still distinct strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};
use crate::store::PublicUser;

/// Claims for short-lived access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    pub jti: String,
}

/// Claims for long-lived refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub jti: String,
}

impl AccessClaims {
    pub fn new(user: &PublicUser, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            iat: now,
            exp: now + expiry_seconds,
            iss: issuer,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// A subject that is not a UUID is treated like any other bad token.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        parse_subject(&self.sub)
    }
}

impl RefreshClaims {
    pub fn new(user_id: Uuid, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            iat: now,
            exp: now + expiry_seconds,
            iss: issuer,
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        parse_subject(&self.sub)
    }
}

fn parse_subject(sub: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> PublicUser {
        PublicUser {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            full_name: "Alice A".to_string(),
            avatar: String::new(),
            cover_image: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_claims_creation() {
        let user = user();
        let claims = AccessClaims::new(&user, 900, "test".to_string());

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.user_id().unwrap(), user.id);
    }

    #[test]
    fn test_refresh_claims_have_unique_ids() {
        let id = Uuid::new_v4();
        let first = RefreshClaims::new(id, 60, "test".to_string());
        let second = RefreshClaims::new(id, 60, "test".to_string());

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_invalid_subject_is_an_auth_error() {
        let mut claims = RefreshClaims::new(Uuid::new_v4(), 60, "test".to_string());
        claims.sub = "invalid-uuid".to_string();

        assert!(matches!(
            claims.user_id(),
            Err(AppError::Auth(AuthError::TokenInvalid))
        ));
    }
}
