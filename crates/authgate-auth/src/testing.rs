//! Shared test doubles for the directory store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::storage::{BoundedUserStorage, NewUser, User, UserStorage, UserUpdate};
use crate::types::{RefreshRecord, UserId};
use crate::AuthResult;

pub const TEST_ISSUER: &str = "http://auth.test";
pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

pub fn test_config() -> Arc<AuthConfig> {
    Arc::new(AuthConfig::new(TEST_ISSUER, TEST_SECRET))
}

pub fn bounded(store: Arc<dyn UserStorage>) -> BoundedUserStorage {
    BoundedUserStorage::new(store, Duration::from_secs(5))
}

/// Mock user storage for testing.
#[derive(Default)]
pub struct MockUserStorage {
    users: RwLock<HashMap<UserId, User>>,
}

impl MockUserStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an active user and returns its id.
    pub fn add_user(&self, email: &str) -> UserId {
        let user = NewUser::new(email, "$argon2id$test").into_user();
        let id = user.id;
        self.users.write().unwrap().insert(id, user);
        id
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        self.users.read().unwrap().get(id).cloned()
    }

    pub fn set_active(&self, id: &UserId, active: bool) {
        if let Some(user) = self.users.write().unwrap().get_mut(id) {
            user.active = active;
        }
    }

    pub fn push_record(&self, id: &UserId, record: RefreshRecord) {
        if let Some(user) = self.users.write().unwrap().get_mut(id) {
            user.refresh_tokens.push(record);
        }
    }
}

#[async_trait]
impl UserStorage for MockUserStorage {
    async fn find_active_by_id(&self, id: &UserId) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .get(id)
            .filter(|u| u.active)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> AuthResult<User> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::conflict("User already exists"));
        }
        let user = user.into_user();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn append_refresh_token(&self, id: &UserId, record: RefreshRecord) -> AuthResult<User> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| AuthError::storage("User not found"))?;
        if user.refresh_tokens.iter().any(|r| r.matches(&record.token)) {
            return Err(AuthError::DuplicateRefreshToken);
        }
        user.refresh_tokens.push(record);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn replace_refresh_token(
        &self,
        id: &UserId,
        presented: &str,
        replacement: RefreshRecord,
    ) -> AuthResult<Option<User>> {
        let mut users = self.users.write().unwrap();
        let Some(user) = users.get_mut(id) else {
            return Ok(None);
        };
        if !user.refresh_tokens.iter().any(|r| r.matches(presented)) {
            return Ok(None);
        }
        if user.refresh_tokens.iter().any(|r| r.matches(&replacement.token)) {
            return Err(AuthError::DuplicateRefreshToken);
        }
        let Some(slot) = user.refresh_tokens.iter_mut().find(|r| r.matches(presented)) else {
            return Ok(None);
        };
        *slot = replacement;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn remove_refresh_tokens(&self, id: &UserId, identifier: &str) -> AuthResult<u64> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| AuthError::storage("User not found"))?;
        let before = user.refresh_tokens.len();
        user.refresh_tokens.retain(|r| r.identifier != identifier);
        Ok((before - user.refresh_tokens.len()) as u64)
    }

    async fn update(&self, id: &UserId, update: UserUpdate) -> AuthResult<User> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| AuthError::storage("User not found"))?;
        update.apply(user);
        Ok(user.clone())
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        Ok(self.users.read().unwrap().values().cloned().collect())
    }
}

/// Store stub that fails the test if any method is invoked.
pub struct UnreachableStorage;

#[async_trait]
impl UserStorage for UnreachableStorage {
    async fn find_active_by_id(&self, _id: &UserId) -> AuthResult<Option<User>> {
        panic!("store must not be consulted: find_active_by_id")
    }
    async fn find_by_email(&self, _email: &str) -> AuthResult<Option<User>> {
        panic!("store must not be consulted: find_by_email")
    }
    async fn create(&self, _user: NewUser) -> AuthResult<User> {
        panic!("store must not be consulted: create")
    }
    async fn append_refresh_token(&self, _id: &UserId, _record: RefreshRecord) -> AuthResult<User> {
        panic!("store must not be consulted: append_refresh_token")
    }
    async fn replace_refresh_token(
        &self,
        _id: &UserId,
        _presented: &str,
        _replacement: RefreshRecord,
    ) -> AuthResult<Option<User>> {
        panic!("store must not be consulted: replace_refresh_token")
    }
    async fn remove_refresh_tokens(&self, _id: &UserId, _identifier: &str) -> AuthResult<u64> {
        panic!("store must not be consulted: remove_refresh_tokens")
    }
    async fn update(&self, _id: &UserId, _update: UserUpdate) -> AuthResult<User> {
        panic!("store must not be consulted: update")
    }
    async fn list(&self) -> AuthResult<Vec<User>> {
        panic!("store must not be consulted: list")
    }
}

/// Store whose every call fails.
pub struct FailingStorage;

#[async_trait]
impl UserStorage for FailingStorage {
    async fn find_active_by_id(&self, _id: &UserId) -> AuthResult<Option<User>> {
        Err(AuthError::storage("connection refused"))
    }
    async fn find_by_email(&self, _email: &str) -> AuthResult<Option<User>> {
        Err(AuthError::storage("connection refused"))
    }
    async fn create(&self, _user: NewUser) -> AuthResult<User> {
        Err(AuthError::storage("connection refused"))
    }
    async fn append_refresh_token(&self, _id: &UserId, _record: RefreshRecord) -> AuthResult<User> {
        Err(AuthError::storage("connection refused"))
    }
    async fn replace_refresh_token(
        &self,
        _id: &UserId,
        _presented: &str,
        _replacement: RefreshRecord,
    ) -> AuthResult<Option<User>> {
        Err(AuthError::storage("connection refused"))
    }
    async fn remove_refresh_tokens(&self, _id: &UserId, _identifier: &str) -> AuthResult<u64> {
        Err(AuthError::storage("connection refused"))
    }
    async fn update(&self, _id: &UserId, _update: UserUpdate) -> AuthResult<User> {
        Err(AuthError::storage("connection refused"))
    }
    async fn list(&self) -> AuthResult<Vec<User>> {
        Err(AuthError::storage("connection refused"))
    }
}
