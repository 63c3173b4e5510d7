/// Session Store Accessor
///
/// Reads and writes the single refresh-token field of a user record.
/// Refresh tokens are:
/// - Hashed with SHA-256 before storage (never store plaintext)
/// - One per user: setting a new one silently invalidates the previous one
/// - Compared by digest, which is equality of the token bytes

use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::store::UserStore;

/// Hash a refresh token using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn UserStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Overwrites the stored refresh token unconditionally
    pub async fn set_refresh_token(&self, user_id: Uuid, token: &str) -> Result<(), AppError> {
        let found = self
            .store
            .set_refresh_token(user_id, Some(&hash_token(token)))
            .await?;
        if !found {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    /// Digest of the current refresh token, if a session is open
    pub async fn get_refresh_token(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        Ok(self.store.get_refresh_token(user_id).await?)
    }

    /// Ends the session. Clearing a user that no longer exists is a no-op.
    pub async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), AppError> {
        self.store.set_refresh_token(user_id, None).await?;
        tracing::info!(user_id = %user_id, "Refresh token cleared");
        Ok(())
    }

    /// Swaps `current` for `next` only if `current` is still the stored token.
    /// Of several concurrent rotations presenting the same token, one wins.
    pub async fn replace_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .store
            .replace_refresh_token(user_id, &hash_token(current), &hash_token(next))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryUserStore, NewUser};

    async fn store_with_user() -> (SessionStore, Uuid) {
        let store = Arc::new(InMemoryUserStore::new());
        let user = store
            .insert(NewUser {
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
                full_name: "Alice A".to_string(),
                avatar: "https://media.test/a.png".to_string(),
                cover_image: String::new(),
                password_hash: "$2b$04$hash".to_string(),
            })
            .await
            .unwrap();
        (SessionStore::new(store), user.id)
    }

    #[test]
    fn test_token_hashing() {
        let hash1 = hash_token("token");
        let hash2 = hash_token("token");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, "token");
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash_token("token"), hash_token("token2"));
    }

    #[tokio::test]
    async fn test_refresh_token_is_stored_as_digest() {
        let (sessions, user_id) = store_with_user().await;
        sessions.set_refresh_token(user_id, "r0").await.unwrap();

        let stored = sessions.get_refresh_token(user_id).await.unwrap();
        assert_eq!(stored, Some(hash_token("r0")));
    }

    #[tokio::test]
    async fn test_replace_only_succeeds_once_per_presented_token() {
        let (sessions, user_id) = store_with_user().await;
        sessions.set_refresh_token(user_id, "r0").await.unwrap();

        assert!(sessions.replace_refresh_token(user_id, "r0", "r1").await.unwrap());
        assert!(!sessions.replace_refresh_token(user_id, "r0", "r2").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_refresh_token() {
        let (sessions, user_id) = store_with_user().await;
        sessions.set_refresh_token(user_id, "r0").await.unwrap();
        sessions.clear_refresh_token(user_id).await.unwrap();

        assert!(sessions.get_refresh_token(user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_for_unknown_user_is_not_found() {
        let (sessions, _) = store_with_user().await;
        let result = sessions.set_refresh_token(Uuid::new_v4(), "r0").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
