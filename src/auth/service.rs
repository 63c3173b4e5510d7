/// Session Lifecycle
///
/// Register, login, logout and refresh, plus the account operations that
/// run behind the auth gate. Handlers stay thin: they translate HTTP into
/// these inputs and set cookies on the way out.

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::gate;
use crate::auth::jwt::{TokenIssuer, TokenPair};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::SessionStore;
use crate::auth::rotation;
use crate::error::{AppError, AuthError, ValidationError};
use crate::media::{MediaFile, MediaUploader};
use crate::store::{NewUser, PublicUser, UserStore};
use crate::validators::{
    is_valid_email, is_valid_full_name, is_valid_username, require_field,
};

const AVATAR_FOLDER: &str = "avatars";
const COVER_IMAGE_FOLDER: &str = "coverImages";

/// Raw registration input; every field is checked here
#[derive(Debug, Default)]
pub struct RegisterInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<MediaFile>,
    pub cover_image: Option<MediaFile>,
}

#[derive(Debug, Default)]
pub struct LoginInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    sessions: SessionStore,
    issuer: TokenIssuer,
    uploader: Arc<dyn MediaUploader>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        uploader: Arc<dyn MediaUploader>,
        issuer: TokenIssuer,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            sessions: SessionStore::new(store.clone()),
            store,
            issuer,
            uploader,
            bcrypt_cost,
        }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<PublicUser, AppError> {
        let full_name = require_field(input.full_name.as_deref(), "fullName")?;
        let email = require_field(input.email.as_deref(), "email")?;
        require_field(input.password.as_deref(), "password")?;
        let username = require_field(input.username.as_deref(), "username")?;

        let full_name = is_valid_full_name(&full_name)?;
        let email = is_valid_email(&email)?;
        let username = is_valid_username(&username)?;

        if self.store.exists_with(&email, &username).await? {
            return Err(AppError::Conflict(
                "User with given email or username already exists".to_string(),
            ));
        }

        let avatar = input
            .avatar
            .ok_or_else(|| ValidationError::MissingFile("avatar".to_string()))?;

        // Hash before uploading so a rejected password leaves no orphaned media.
        let password = input.password.unwrap_or_default();
        let password_hash = hash_password(&password, self.bcrypt_cost)?;

        let avatar_url = self.uploader.upload(AVATAR_FOLDER, avatar).await.map_err(|e| {
            tracing::warn!(error = %e, "Avatar upload failed during registration");
            ValidationError::UploadFailed("avatar".to_string())
        })?;

        let cover_image_url = match input.cover_image {
            Some(file) => match self.uploader.upload(COVER_IMAGE_FOLDER, file).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(error = %e, "Cover image upload failed, continuing without it");
                    String::new()
                }
            },
            None => String::new(),
        };

        let record = self
            .store
            .insert(NewUser {
                username,
                email,
                full_name,
                avatar: avatar_url,
                cover_image: cover_image_url,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %record.id, "User registered");
        Ok(record.to_public())
    }

    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, AppError> {
        let email = input
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        let username = input
            .username
            .as_deref()
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty());

        if email.is_none() && username.is_none() {
            return Err(ValidationError::MissingLoginIdentifier.into());
        }
        require_field(input.password.as_deref(), "password")?;
        let password = input.password.as_deref().unwrap_or_default();

        let user = self
            .store
            .find_by_login(email.as_deref(), username.as_deref())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let profile = user.to_public();
        let tokens = self.issuer.issue_pair(&profile)?;
        self.sessions
            .set_refresh_token(user.id, &tokens.refresh_token)
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutput {
            user: profile,
            tokens,
        })
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.sessions.clear_refresh_token(user_id).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    pub async fn refresh(&self, incoming: Option<&str>) -> Result<TokenPair, AppError> {
        rotation::rotate(&self.issuer, self.store.as_ref(), &self.sessions, incoming).await
    }

    pub async fn authenticate(&self, presented: Option<&str>) -> Result<PublicUser, AppError> {
        gate::authenticate(&self.issuer, self.store.as_ref(), presented).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<(), AppError> {
        require_field(old_password, "oldPassword")?;
        require_field(new_password, "newPassword")?;
        let (old_password, new_password) =
            (old_password.unwrap_or_default(), new_password.unwrap_or_default());

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_password(old_password, &user.password_hash)? {
            return Err(ValidationError::InvalidOldPassword.into());
        }

        let password_hash = hash_password(new_password, self.bcrypt_cost)?;
        if !self.store.update_password(user_id, &password_hash).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    pub async fn update_account(
        &self,
        user_id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<PublicUser, AppError> {
        let full_name = is_valid_full_name(&require_field(full_name, "fullName")?)?;
        let email = is_valid_email(&require_field(email, "email")?)?;

        self.store
            .update_account(user_id, &full_name, &email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_avatar(
        &self,
        user_id: Uuid,
        file: Option<MediaFile>,
    ) -> Result<PublicUser, AppError> {
        let file = file.ok_or_else(|| ValidationError::MissingFile("avatar".to_string()))?;
        let url = self.uploader.upload(AVATAR_FOLDER, file).await.map_err(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Avatar upload failed");
            ValidationError::UploadFailed("avatar".to_string())
        })?;

        self.store
            .update_avatar(user_id, &url)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_cover_image(
        &self,
        user_id: Uuid,
        file: Option<MediaFile>,
    ) -> Result<PublicUser, AppError> {
        let file = file.ok_or_else(|| ValidationError::MissingFile("coverImage".to_string()))?;
        let url = self.uploader.upload(COVER_IMAGE_FOLDER, file).await.map_err(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Cover image upload failed");
            ValidationError::UploadFailed("coverImage".to_string())
        })?;

        self.store
            .update_cover_image(user_id, &url)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
