//! Time-bounded directory store access.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::user::{NewUser, User, UserStorage, UserUpdate};
use crate::error::AuthError;
use crate::types::{RefreshRecord, UserId};
use crate::AuthResult;

/// Wraps a [`UserStorage`] so that no call blocks longer than `timeout`.
///
/// A call that does not complete in time is abandoned and surfaces as
/// [`AuthError::Unavailable`].
#[derive(Clone)]
pub struct BoundedUserStorage {
    inner: Arc<dyn UserStorage>,
    timeout: Duration,
}

impl BoundedUserStorage {
    /// Creates a bounded view over `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn UserStorage>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = AuthResult<T>> + Send,
    ) -> AuthResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Directory store call timed out"
                );
                Err(AuthError::unavailable(operation))
            }
        }
    }
}

impl std::fmt::Debug for BoundedUserStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedUserStorage")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UserStorage for BoundedUserStorage {
    async fn find_active_by_id(&self, id: &UserId) -> AuthResult<Option<User>> {
        self.bounded("find_active_by_id", self.inner.find_active_by_id(id))
            .await
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        self.bounded("find_by_email", self.inner.find_by_email(email))
            .await
    }

    async fn create(&self, user: NewUser) -> AuthResult<User> {
        self.bounded("create", self.inner.create(user)).await
    }

    async fn append_refresh_token(&self, id: &UserId, record: RefreshRecord) -> AuthResult<User> {
        self.bounded(
            "append_refresh_token",
            self.inner.append_refresh_token(id, record),
        )
        .await
    }

    async fn replace_refresh_token(
        &self,
        id: &UserId,
        presented: &str,
        replacement: RefreshRecord,
    ) -> AuthResult<Option<User>> {
        self.bounded(
            "replace_refresh_token",
            self.inner.replace_refresh_token(id, presented, replacement),
        )
        .await
    }

    async fn remove_refresh_tokens(&self, id: &UserId, identifier: &str) -> AuthResult<u64> {
        self.bounded(
            "remove_refresh_tokens",
            self.inner.remove_refresh_tokens(id, identifier),
        )
        .await
    }

    async fn update(&self, id: &UserId, update: UserUpdate) -> AuthResult<User> {
        self.bounded("update", self.inner.update(id, update)).await
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        self.bounded("list", self.inner.list()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store whose calls never complete.
    struct HangingStorage;

    #[async_trait]
    impl UserStorage for HangingStorage {
        async fn find_active_by_id(&self, _id: &UserId) -> AuthResult<Option<User>> {
            std::future::pending().await
        }
        async fn find_by_email(&self, _email: &str) -> AuthResult<Option<User>> {
            std::future::pending().await
        }
        async fn create(&self, _user: NewUser) -> AuthResult<User> {
            std::future::pending().await
        }
        async fn append_refresh_token(
            &self,
            _id: &UserId,
            _record: RefreshRecord,
        ) -> AuthResult<User> {
            std::future::pending().await
        }
        async fn replace_refresh_token(
            &self,
            _id: &UserId,
            _presented: &str,
            _replacement: RefreshRecord,
        ) -> AuthResult<Option<User>> {
            std::future::pending().await
        }
        async fn remove_refresh_tokens(&self, _id: &UserId, _identifier: &str) -> AuthResult<u64> {
            std::future::pending().await
        }
        async fn update(&self, _id: &UserId, _update: UserUpdate) -> AuthResult<User> {
            std::future::pending().await
        }
        async fn list(&self) -> AuthResult<Vec<User>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_store_becomes_unavailable() {
        let store = BoundedUserStorage::new(Arc::new(HangingStorage), Duration::from_secs(5));

        let err = store
            .find_active_by_id(&UserId::generate())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Unavailable { ref operation } if operation == "find_active_by_id"
        ));
        assert_eq!(err.public_code(), "INTERNAL_SERVER_ERROR");

        let err = store
            .append_refresh_token(&UserId::generate(), RefreshRecord::new("t", "phone"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unavailable { .. }));
    }
}
