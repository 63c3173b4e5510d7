use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{NewUser, PublicUser, StoreError, UserRecord, UserStore};

/// Process-local user store. One lock guards the whole map, so every
/// operation, including uniqueness checks on insert, is atomic.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, UserRecord>>, StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Backend("user store lock poisoned".to_string()))
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Result<Option<PublicUser>, StoreError>
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut users = self.lock()?;
        Ok(users.get_mut(&id).map(|user| {
            apply(user);
            user.updated_at = Utc::now();
            user.to_public()
        }))
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.lock()?;

        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username".to_string()));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            password_hash: user.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<PublicUser>, StoreError> {
        Ok(self.lock()?.get(&id).map(UserRecord::to_public))
    }

    async fn find_by_login(
        &self,
        email: Option<&str>,
        username: Option<&str>,
    ) -> Result<Option<UserRecord>, StoreError> {
        let users = self.lock()?;
        Ok(users
            .values()
            .find(|u| {
                email.map_or(false, |e| u.email == e) || username.map_or(false, |n| u.username == n)
            })
            .cloned())
    }

    async fn exists_with(&self, email: &str, username: &str) -> Result<bool, StoreError> {
        let users = self.lock()?;
        Ok(users
            .values()
            .any(|u| u.email == email || u.username == username))
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        token_digest: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut users = self.lock()?;
        match users.get_mut(&id) {
            Some(user) => {
                user.refresh_token = token_digest.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_refresh_token(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(&id).and_then(|u| u.refresh_token.clone()))
    }

    async fn replace_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
    ) -> Result<bool, StoreError> {
        let mut users = self.lock()?;
        match users.get_mut(&id) {
            Some(user) if user.refresh_token.as_deref() == Some(current) => {
                user.refresh_token = Some(next.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let updated = self.update(id, |u| u.password_hash = password_hash.to_string())?;
        Ok(updated.is_some())
    }

    async fn update_account(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<Option<PublicUser>, StoreError> {
        let mut users = self.lock()?;
        if users.values().any(|u| u.id != id && u.email == email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        Ok(users.get_mut(&id).map(|user| {
            user.full_name = full_name.to_string();
            user.email = email.to_string();
            user.updated_at = Utc::now();
            user.to_public()
        }))
    }

    async fn update_avatar(&self, id: Uuid, url: &str) -> Result<Option<PublicUser>, StoreError> {
        self.update(id, |u| u.avatar = url.to_string())
    }

    async fn update_cover_image(
        &self,
        id: Uuid,
        url: &str,
    ) -> Result<Option<PublicUser>, StoreError> {
        self.update(id, |u| u.cover_image = url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            avatar: "https://media.test/avatars/a.png".to_string(),
            cover_image: String::new(),
            password_hash: "$2b$04$hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email_and_username() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("alice", "a@x.com")).await.unwrap();

        let same_email = store.insert(new_user("other", "a@x.com")).await;
        assert_eq!(same_email.unwrap_err(), StoreError::Duplicate("email".to_string()));

        let same_username = store.insert(new_user("alice", "b@x.com")).await;
        assert_eq!(same_username.unwrap_err(), StoreError::Duplicate("username".to_string()));
    }

    #[tokio::test]
    async fn test_find_by_login_matches_either_identifier() {
        let store = InMemoryUserStore::new();
        let created = store.insert(new_user("alice", "a@x.com")).await.unwrap();

        let by_email = store.find_by_login(Some("a@x.com"), None).await.unwrap();
        let by_username = store.find_by_login(None, Some("alice")).await.unwrap();
        let neither = store.find_by_login(None, None).await.unwrap();

        assert_eq!(by_email.unwrap().id, created.id);
        assert_eq!(by_username.unwrap().id, created.id);
        assert!(neither.is_none());
    }

    #[tokio::test]
    async fn test_replace_refresh_token_is_compare_and_swap() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("alice", "a@x.com")).await.unwrap();
        store.set_refresh_token(user.id, Some("r0")).await.unwrap();

        assert!(store.replace_refresh_token(user.id, "r0", "r1").await.unwrap());
        assert!(!store.replace_refresh_token(user.id, "r0", "r2").await.unwrap());
        assert_eq!(store.get_refresh_token(user.id).await.unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_clearing_refresh_token() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("alice", "a@x.com")).await.unwrap();
        store.set_refresh_token(user.id, Some("r0")).await.unwrap();
        store.set_refresh_token(user.id, None).await.unwrap();

        assert!(store.get_refresh_token(user.id).await.unwrap().is_none());
        assert!(!store.set_refresh_token(Uuid::new_v4(), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_account_rejects_taken_email() {
        let store = InMemoryUserStore::new();
        let alice = store.insert(new_user("alice", "a@x.com")).await.unwrap();
        store.insert(new_user("bob", "b@x.com")).await.unwrap();

        let result = store.update_account(alice.id, "Alice", "b@x.com").await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));

        let updated = store.update_account(alice.id, "Alice B", "a2@x.com").await.unwrap();
        assert_eq!(updated.unwrap().email, "a2@x.com");
    }
}
