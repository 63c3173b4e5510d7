/// Token Issuer
///
/// Signs and verifies access and refresh tokens (HS256). Each token class has
/// its own secret, so a leaked access secret cannot mint refresh tokens and
/// vice versa. Issuing is pure: persisting the refresh token is the caller's job.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::store::PublicUser;

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    issuer: String,
}

impl TokenIssuer {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
            issuer: config.issuer.clone(),
        }
    }

    pub fn issue_access(&self, user: &PublicUser) -> Result<String, AppError> {
        let claims = AccessClaims::new(user, self.access_token_expiry, self.issuer.clone());
        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| AppError::Internal(format!("Access token generation failed: {}", e)))
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, AppError> {
        let claims = RefreshClaims::new(user_id, self.refresh_token_expiry, self.issuer.clone());
        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| AppError::Internal(format!("Refresh token generation failed: {}", e)))
    }

    /// Issues both tokens with fresh lifetimes
    pub fn issue_pair(&self, user: &PublicUser) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access(user)?,
            refresh_token: self.issue_refresh(user.id)?,
        })
    }

    /// Verifies signature, issuer and expiry of an access token
    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.verify(token, &self.access_decoding)
    }

    /// Verifies signature, issuer and expiry of a refresh token
    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        self.verify(token, &self.refresh_decoding)
    }

    fn verify<T: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<T, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        decode::<T>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation error: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::Auth(AuthError::TokenExpired),
                    _ => AppError::Auth(AuthError::TokenInvalid),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            access_token_secret: "test-access-secret-at-least-32-characters".to_string(),
            refresh_token_secret: "test-refresh-secret-at-least-32-characters".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 864_000,
            issuer: "test".to_string(),
        }
    }

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
    fn test_issue_and_decode_access_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let user = user();

        let token = issuer.issue_access(&user).expect("Failed to generate token");
        let claims = issuer.decode_access(&token).expect("Failed to validate token");

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.iss, "test");
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_issue_and_decode_refresh_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let user_id = Uuid::new_v4();

        let token = issuer.issue_refresh(user_id).unwrap();
        let claims = issuer.decode_refresh(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_token_classes_do_not_cross_verify() {
        let issuer = TokenIssuer::new(&get_test_config());
        let user = user();
        let pair = issuer.issue_pair(&user).unwrap();

        assert!(issuer.decode_refresh(&pair.access_token).is_err());
        assert!(issuer.decode_access(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_pairs_issued_back_to_back_differ() {
        let issuer = TokenIssuer::new(&get_test_config());
        let user = user();

        let first = issuer.issue_pair(&user).unwrap();
        let second = issuer.issue_pair(&user).unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_tampered_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let token = issuer.issue_access(&user()).unwrap();

        let tampered = format!("{}X", token);
        assert!(matches!(
            issuer.decode_access(&tampered),
            Err(AppError::Auth(AuthError::TokenInvalid))
        ));
        assert!(issuer.decode_access("invalid.token.here").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = get_test_config();
        let issuer = TokenIssuer::new(&config);
        let mut claims = AccessClaims::new(&user(), 900, "test".to_string());
        claims.iat -= 3600;
        claims.exp = Utc::now().timestamp() - 5;

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.access_token_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            issuer.decode_access(&token),
            Err(AppError::Auth(AuthError::TokenExpired))
        ));
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = get_test_config();
        let token = TokenIssuer::new(&config).issue_access(&user()).unwrap();

        config.issuer = "wrong-issuer".to_string();
        let result = TokenIssuer::new(&config).decode_access(&token);

        assert!(result.is_err());
    }
}
