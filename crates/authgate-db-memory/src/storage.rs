//! Dashmap-backed implementation of [`UserStorage`].

use async_trait::async_trait;
use authgate_auth::{
    AuthError, AuthResult, NewUser, RefreshRecord, User, UserId, UserStorage, UserUpdate,
};
use dashmap::{DashMap, mapref::entry::Entry};
use time::OffsetDateTime;

/// In-memory user directory.
///
/// Users are keyed by id. A second map indexes lowercased emails so that
/// registration can reserve an address atomically through the entry API.
#[derive(Debug, Default)]
pub struct InMemoryUserStorage {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
}

impl InMemoryUserStorage {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no users are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Runs `f` against the stored user while holding its shard lock.
    fn mutate<T>(&self, id: &UserId, f: impl FnOnce(&mut User) -> T) -> AuthResult<T> {
        let mut user = self
            .users
            .get_mut(id)
            .ok_or_else(|| AuthError::storage("User not found"))?;
        Ok(f(user.value_mut()))
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn lists_token(user: &User, token: &str) -> bool {
    user.refresh_tokens.iter().any(|record| record.matches(token))
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_active_by_id(&self, id: &UserId) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .get(id)
            .filter(|user| user.is_active())
            .map(|user| user.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let Some(id) = self.emails.get(&email_key(email)).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn create(&self, user: NewUser) -> AuthResult<User> {
        match self.emails.entry(email_key(&user.email)) {
            Entry::Occupied(_) => Err(AuthError::conflict("User already exists")),
            Entry::Vacant(slot) => {
                let user = user.into_user();
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                tracing::debug!(user_id = %user.id, "User created");
                Ok(user)
            }
        }
    }

    async fn append_refresh_token(&self, id: &UserId, record: RefreshRecord) -> AuthResult<User> {
        self.mutate(id, |user| {
            if lists_token(user, &record.token) {
                return Err(AuthError::DuplicateRefreshToken);
            }
            user.refresh_tokens.push(record);
            user.updated_at = OffsetDateTime::now_utc();
            Ok(user.clone())
        })?
    }

    async fn replace_refresh_token(
        &self,
        id: &UserId,
        presented: &str,
        replacement: RefreshRecord,
    ) -> AuthResult<Option<User>> {
        let Some(mut user) = self.users.get_mut(id) else {
            return Ok(None);
        };
        if !lists_token(&user, presented) {
            return Ok(None);
        }
        if lists_token(&user, &replacement.token) {
            return Err(AuthError::DuplicateRefreshToken);
        }
        let Some(slot) = user
            .refresh_tokens
            .iter_mut()
            .find(|record| record.matches(presented))
        else {
            return Ok(None);
        };
        *slot = replacement;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn remove_refresh_tokens(&self, id: &UserId, identifier: &str) -> AuthResult<u64> {
        self.mutate(id, |user| {
            let before = user.refresh_tokens.len();
            user.refresh_tokens
                .retain(|record| record.identifier != identifier);
            let removed = (before - user.refresh_tokens.len()) as u64;
            if removed > 0 {
                user.updated_at = OffsetDateTime::now_utc();
            }
            removed
        })
    }

    async fn update(&self, id: &UserId, update: UserUpdate) -> AuthResult<User> {
        self.mutate(id, |user| {
            update.apply(user);
            user.clone()
        })
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}
