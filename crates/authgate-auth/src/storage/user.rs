//! User storage trait.
//!
//! Defines the directory store contract consumed by the credential lifecycle.
//! Implementations are provided by storage backends (e.g. `authgate-db-memory`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::{RefreshRecord, UserId};

/// Role assigned to self-registered users.
pub const DEFAULT_ROLE: &str = "user";

// =============================================================================
// User Type
// =============================================================================

/// A user record in the directory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, also the subject of every token issued to the user.
    pub id: UserId,

    /// Login email. Unique across the directory.
    pub email: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Argon2id PHC string.
    pub password_hash: String,

    /// Assigned roles.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Inactive users never authenticate, whatever tokens they hold.
    pub active: bool,

    /// Outstanding refresh tokens, oldest first.
    #[serde(default)]
    pub refresh_tokens: Vec<RefreshRecord>,

    /// When the user was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the user was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Returns `true` if the user account is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` if the user has a specific role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns the stored record holding exactly `token`, if any.
    #[must_use]
    pub fn find_refresh_record(&self, token: &str) -> Option<&RefreshRecord> {
        self.refresh_tokens.iter().find(|r| r.matches(token))
    }

    /// Returns the API view of this user.
    #[must_use]
    pub fn to_public(&self) -> PublicUser {
        PublicUser::from(self)
    }
}

/// User fields safe to return to API callers.
///
/// Never carries the password hash or refresh tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    /// User identifier (hex).
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Assigned roles.
    pub roles: Vec<String>,
    /// Whether the account is active.
    pub active: bool,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last update time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            roles: user.roles.clone(),
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Data for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Assigned roles.
    pub roles: Vec<String>,
}

impl NewUser {
    /// Creates an active self-registered user with the default role.
    #[must_use]
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            password_hash: password_hash.into(),
            roles: vec![DEFAULT_ROLE.to_string()],
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Materialises the record with a fresh identifier.
    #[must_use]
    pub fn into_user(self) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: UserId::generate(),
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            roles: self.roles,
            active: true,
            refresh_tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New password hash.
    pub password_hash: Option<String>,
    /// New active flag.
    pub active: Option<bool>,
}

impl UserUpdate {
    /// Update that replaces the password hash.
    #[must_use]
    pub fn password(hash: impl Into<String>) -> Self {
        Self {
            password_hash: Some(hash.into()),
            ..Self::default()
        }
    }

    /// Update that deactivates the user.
    #[must_use]
    pub fn deactivate() -> Self {
        Self {
            active: Some(false),
            ..Self::default()
        }
    }

    /// Applies the update to a user record and bumps `updated_at`.
    pub fn apply(&self, user: &mut User) {
        if let Some(ref hash) = self.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(active) = self.active {
            user.active = active;
        }
        user.updated_at = OffsetDateTime::now_utc();
    }
}

// =============================================================================
// User Storage Trait
// =============================================================================

/// Directory store operations.
///
/// Every method is a single atomic unit from the store's perspective. In
/// particular the refresh-record mutations must not be implemented as a
/// read-modify-write by the caller: concurrent sessions of the same user
/// append at the same time.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Find an active user by ID.
    ///
    /// Returns `None` if the user doesn't exist or is inactive. The two
    /// cases are deliberately indistinguishable.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_active_by_id(&self, id: &UserId) -> AuthResult<Option<User>>;

    /// Find a user by email, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Create a new user and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Conflict` if the email is already registered, or
    /// an error if the storage operation fails.
    async fn create(&self, user: NewUser) -> AuthResult<User>;

    /// Append a refresh record to the user's list and return the updated user.
    ///
    /// A token string is listed at most once per user: if `record.token` is
    /// already present nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DuplicateRefreshToken` if the token is already
    /// listed, or an error if the user doesn't exist or the storage operation
    /// fails.
    async fn append_refresh_token(&self, id: &UserId, record: RefreshRecord) -> AuthResult<User>;

    /// Atomically replace the record holding `presented` with `replacement`.
    ///
    /// Returns `None` (and changes nothing) if `presented` is not currently
    /// listed for the user, so at most one of several concurrent rotations of
    /// the same token succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DuplicateRefreshToken` (and changes nothing) if the
    /// replacement token is already listed, `presented` included, or an error
    /// if the storage operation fails.
    async fn replace_refresh_token(
        &self,
        id: &UserId,
        presented: &str,
        replacement: RefreshRecord,
    ) -> AuthResult<Option<User>>;

    /// Remove every refresh record with the given session label.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the user doesn't exist or the storage operation fails.
    async fn remove_refresh_tokens(&self, id: &UserId, identifier: &str) -> AuthResult<u64>;

    /// Apply a partial update and return the updated user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user doesn't exist or the storage operation fails.
    async fn update(&self, id: &UserId, update: UserUpdate) -> AuthResult<User>;

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list(&self) -> AuthResult<Vec<User>>;
}
