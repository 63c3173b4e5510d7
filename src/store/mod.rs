/// User Record Store
///
/// Abstract persistence for user identities. The auth core only depends on
/// the `UserStore` trait; `PgUserStore` backs it with Postgres and
/// `InMemoryUserStore` with a mutex-guarded map.
///
/// Every write touches exactly one record and is atomic for that record.

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Full user record, including credential fields
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub password_hash: String,
    /// SHA-256 digest of the current refresh token, if a session is open
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Projection safe to hand to clients: no password, no refresh token.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Sanitized user identity
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new record
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A unique field (email or username) is already taken
    Duplicate(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Duplicate(what) => write!(f, "Duplicate entry: {}", what),
            StoreError::Backend(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// Loads only the public projection of a record.
    async fn find_profile(&self, id: Uuid) -> Result<Option<PublicUser>, StoreError>;

    /// Matches a record whose email equals `email` or whose username equals
    /// `username`. Absent criteria never match.
    async fn find_by_login(
        &self,
        email: Option<&str>,
        username: Option<&str>,
    ) -> Result<Option<UserRecord>, StoreError>;

    async fn exists_with(&self, email: &str, username: &str) -> Result<bool, StoreError>;

    /// Overwrites the stored refresh-token digest; `None` clears it.
    /// Returns `false` when no such user exists.
    async fn set_refresh_token(
        &self,
        id: Uuid,
        token_digest: Option<&str>,
    ) -> Result<bool, StoreError>;

    async fn get_refresh_token(&self, id: Uuid) -> Result<Option<String>, StoreError>;

    /// Replaces the digest only if it still equals `current`.
    async fn replace_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, StoreError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;

    async fn update_account(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<Option<PublicUser>, StoreError>;

    async fn update_avatar(&self, id: Uuid, url: &str) -> Result<Option<PublicUser>, StoreError>;

    async fn update_cover_image(
        &self,
        id: Uuid,
        url: &str,
    ) -> Result<Option<PublicUser>, StoreError>;
}
