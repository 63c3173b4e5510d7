use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{NewUser, PublicUser, StoreError, UserRecord, UserStore};

const UNIQUE_VIOLATION: &str = "23505";

const PUBLIC_COLUMNS: &str =
    "id, username, email, full_name, avatar, cover_image, created_at, updated_at";
const ALL_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, \
     password_hash, refresh_token, created_at, updated_at";

/// Postgres-backed user store (schema in `migrations/`)
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("users").to_string();
                return StoreError::Duplicate(constraint);
            }
        }
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar, cover_image,
                               password_hash, refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, $8)
            RETURNING {}
            "#,
            ALL_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            ALL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<PublicUser>, StoreError> {
        let profile = sqlx::query_as::<_, PublicUser>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            PUBLIC_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn find_by_login(
        &self,
        email: Option<&str>,
        username: Option<&str>,
    ) -> Result<Option<UserRecord>, StoreError> {
        if email.is_none() && username.is_none() {
            return Ok(None);
        }

        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1 OR username = $2 LIMIT 1",
            ALL_COLUMNS
        ))
        .bind(email)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn exists_with(&self, email: &str, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        token_digest: Option<&str>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token_digest)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_refresh_token(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        let digest = sqlx::query_scalar::<_, Option<String>>(
            "SELECT refresh_token FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(digest.flatten())
    }

    async fn replace_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $3 WHERE id = $1 AND refresh_token = $2",
        )
        .bind(id)
        .bind(current)
        .bind(next)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_account(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<Option<PublicUser>, StoreError> {
        let profile = sqlx::query_as::<_, PublicUser>(&format!(
            "UPDATE users SET full_name = $2, email = $3, updated_at = $4 WHERE id = $1 RETURNING {}",
            PUBLIC_COLUMNS
        ))
        .bind(id)
        .bind(full_name)
        .bind(email)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn update_avatar(&self, id: Uuid, url: &str) -> Result<Option<PublicUser>, StoreError> {
        let profile = sqlx::query_as::<_, PublicUser>(&format!(
            "UPDATE users SET avatar = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            PUBLIC_COLUMNS
        ))
        .bind(id)
        .bind(url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn update_cover_image(
        &self,
        id: Uuid,
        url: &str,
    ) -> Result<Option<PublicUser>, StoreError> {
        let profile = sqlx::query_as::<_, PublicUser>(&format!(
            "UPDATE users SET cover_image = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            PUBLIC_COLUMNS
        ))
        .bind(id)
        .bind(url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
