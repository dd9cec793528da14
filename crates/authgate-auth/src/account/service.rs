//! Account operations.
//!
//! Registration, password login, explicit token validation and the gated
//! operations an authenticated user performs on their own account.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::credentials::{AuthenticatedIdentity, CredentialValidator, hash_password, verify_password};
use crate::error::AuthError;
use crate::session::{IssuedSession, SessionService};
use crate::storage::{BoundedUserStorage, NewUser, PublicUser, User, UserStorage, UserUpdate};
use crate::token::JwtService;
use crate::types::UserId;

/// Password hashed once and verified against when a login names no active user.
const UNMATCHED_LOGIN_PASSWORD: &str = "authgate-unmatched-login";

/// Account operations composed from the credential lifecycle services.
#[derive(Debug, Clone)]
pub struct AccountService {
    store: BoundedUserStorage,
    sessions: SessionService,
    validator: CredentialValidator,
    unmatched_hash: Arc<OnceCell<String>>,
}

impl AccountService {
    /// Wires the services around a directory store.
    ///
    /// `config` is expected to be validated already.
    #[must_use]
    pub fn new(config: Arc<AuthConfig>, store: Arc<dyn UserStorage>) -> Self {
        let jwt = Arc::new(JwtService::new(config.signing.secret.as_bytes()));
        let store = BoundedUserStorage::new(store, config.store.timeout);

        Self {
            sessions: SessionService::new(config.clone(), jwt.clone(), store.clone()),
            validator: CredentialValidator::new(config, jwt, store.clone()),
            store,
            unmatched_hash: Arc::new(OnceCell::new()),
        }
    }

    /// The session service.
    #[must_use]
    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    /// The credential validator.
    #[must_use]
    pub fn validator(&self) -> &CredentialValidator {
        &self.validator
    }

    /// Registers a new user and issues their first session.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if email or password is empty
    /// - `Conflict` if the email is already registered
    /// - `Internal` or storage errors for dependency failures
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
        label: Option<&str>,
    ) -> AuthResult<IssuedSession> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::invalid_request("email is required"));
        }
        if password.is_empty() {
            return Err(AuthError::invalid_request("password is required"));
        }

        if self.store.find_by_email(email).await?.is_some() {
            tracing::debug!(email = %email, "Registration for existing email");
            return Err(AuthError::conflict("User already exists"));
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let user = self
            .store
            .create(NewUser::new(email, password_hash).with_name(name))
            .await?;

        tracing::info!(user_id = %user.id, "Registered user");
        self.sessions.issue_session(&user.id, label).await
    }

    /// Authenticates with email and password and issues a session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown email, an inactive account
    /// or a wrong password alike.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        label: Option<&str>,
    ) -> AuthResult<IssuedSession> {
        let user = match self.store.find_by_email(email.trim()).await? {
            Some(user) if user.is_active() => user,
            _ => {
                tracing::debug!("Login for unknown or inactive account");
                self.verify_unmatched(password).await?;
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.sessions.issue_session(&user.id, label).await
    }

    /// Runs one discarded password verification, so a login without an active
    /// user costs as much as a wrong password.
    async fn verify_unmatched(&self, password: &str) -> AuthResult<()> {
        let hash = self
            .unmatched_hash
            .get_or_try_init(|| hash_blocking(UNMATCHED_LOGIN_PASSWORD.to_string()))
            .await?;
        verify_blocking(password.to_string(), hash.clone()).await?;
        Ok(())
    }

    /// Validates an access token presented explicitly.
    ///
    /// # Errors
    ///
    /// Only dependency failures are errors; any rejected token yields an
    /// invalid identity.
    pub async fn validate_token(&self, token: &str) -> AuthResult<AuthenticatedIdentity> {
        self.validator.validate_token(token).await
    }

    /// Exchanges a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// See [`SessionService::rotate`].
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<IssuedSession> {
        self.sessions.rotate(refresh_token).await
    }

    /// Replaces the user's password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an empty password, or an error if the
    /// update fails.
    pub async fn update_password(&self, user_id: &UserId, new_password: &str) -> AuthResult<User> {
        if new_password.is_empty() {
            return Err(AuthError::invalid_request("password is required"));
        }

        let password_hash = hash_blocking(new_password.to_string()).await?;
        let user = self
            .store
            .update(user_id, UserUpdate::password(password_hash))
            .await?;

        tracing::info!(user_id = %user_id, "Password updated");
        Ok(user)
    }

    /// Deactivates the user. Every token the user holds stops validating.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn deactivate(&self, user_id: &UserId) -> AuthResult<User> {
        let user = self.store.update(user_id, UserUpdate::deactivate()).await?;
        tracing::info!(user_id = %user_id, "User deactivated");
        Ok(user)
    }

    /// Revokes every refresh token recorded under `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store update fails.
    pub async fn logout(&self, user_id: &UserId, label: &str) -> AuthResult<u64> {
        let removed = self.store.remove_refresh_tokens(user_id, label).await?;
        tracing::info!(user_id = %user_id, session = %label, removed, "Session logged out");
        Ok(removed)
    }

    /// Lists all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails.
    pub async fn list_users(&self) -> AuthResult<Vec<PublicUser>> {
        let users = self.store.list().await?;
        Ok(users.iter().map(PublicUser::from).collect())
    }
}

async fn hash_blocking(password: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::internal(format!("password hashing task failed: {e}")))?
}

async fn verify_blocking(password: String, hash: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::internal(format!("password verification task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockUserStorage, TEST_ISSUER, test_config};

    fn service(store: Arc<MockUserStorage>) -> AccountService {
        AccountService::new(test_config(), store)
    }

    #[tokio::test]
    async fn test_sign_up_issues_recorded_session() {
        let store = Arc::new(MockUserStorage::new());
        let accounts = service(store.clone());

        let session = accounts
            .sign_up("ada@example.com", "pw", Some("Ada".into()), None)
            .await
            .unwrap();

        let stored = store.get(&session.user.id).unwrap();
        assert!(stored.active);
        assert_eq!(stored.name.as_deref(), Some("Ada"));
        assert!(stored.password_hash.starts_with("$argon2id$"));
        assert_eq!(
            stored.find_refresh_record(&session.refresh_token).unwrap().identifier,
            "unknown"
        );

        let identity = accounts.validate_token(&session.access_token).await.unwrap();
        assert!(identity.is_valid());
        assert_eq!(identity.claims().unwrap().issuer(), TEST_ISSUER);
    }

    #[tokio::test]
    async fn test_sign_up_conflict_and_bad_input() {
        let accounts = service(Arc::new(MockUserStorage::new()));
        accounts
            .sign_up("ada@example.com", "pw", None, None)
            .await
            .unwrap();

        let err = accounts
            .sign_up("ada@example.com", "other", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.public_code(), "CONFLICT");

        let err = accounts.sign_up(" ", "pw", None, None).await.unwrap_err();
        assert_eq!(err.public_code(), "BAD_REQUEST");
        let err = accounts
            .sign_up("bob@example.com", "", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.public_code(), "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let store = Arc::new(MockUserStorage::new());
        let accounts = service(store.clone());
        let signup = accounts
            .sign_up("ada@example.com", "pw", None, Some("phone"))
            .await
            .unwrap();

        let session = accounts
            .login("ada@example.com", "pw", Some("laptop"))
            .await
            .unwrap();
        assert_eq!(session.user.id, signup.user.id);

        let stored = store.get(&signup.user.id).unwrap();
        assert_eq!(
            stored.find_refresh_record(&session.refresh_token).unwrap().identifier,
            "laptop"
        );
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = Arc::new(MockUserStorage::new());
        let accounts = service(store.clone());
        accounts
            .sign_up("ada@example.com", "pw", None, None)
            .await
            .unwrap();
        let inactive = accounts
            .sign_up("bob@example.com", "pw", None, None)
            .await
            .unwrap();
        accounts.deactivate(&inactive.user.id).await.unwrap();

        let wrong_password = accounts.login("ada@example.com", "nope", None).await.unwrap_err();
        let unknown = accounts.login("eve@example.com", "pw", None).await.unwrap_err();
        let deactivated = accounts.login("bob@example.com", "pw", None).await.unwrap_err();

        for err in [wrong_password, unknown, deactivated] {
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(err.public_code(), "UNAUTHORIZED");
            assert_eq!(err.public_message(), "Unauthorized");
        }
    }

    #[tokio::test]
    async fn test_login_without_active_user_still_verifies() {
        let store = Arc::new(MockUserStorage::new());
        let accounts = service(store.clone());
        accounts
            .sign_up("ada@example.com", "pw", None, None)
            .await
            .unwrap();
        let bob = accounts
            .sign_up("bob@example.com", "pw", None, None)
            .await
            .unwrap();
        accounts.deactivate(&bob.user.id).await.unwrap();

        // a wrong password checks the user's own hash
        accounts.login("ada@example.com", "nope", None).await.unwrap_err();
        assert!(accounts.unmatched_hash.get().is_none());

        let err = accounts.login("eve@example.com", "pw", None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        let hash = accounts.unmatched_hash.get().unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let accounts = service(store);
        let err = accounts.login("bob@example.com", "pw", None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(accounts.unmatched_hash.get().is_some());
        assert!(!verify_password("pw", hash).unwrap());
    }

    #[tokio::test]
    async fn test_deactivate_invalidates_existing_tokens() {
        let accounts = service(Arc::new(MockUserStorage::new()));
        let session = accounts
            .sign_up("ada@example.com", "pw", None, None)
            .await
            .unwrap();
        assert!(accounts.validate_token(&session.access_token).await.unwrap().is_valid());

        let user = accounts.deactivate(&session.user.id).await.unwrap();
        assert!(!user.active);

        let identity = accounts.validate_token(&session.access_token).await.unwrap();
        assert!(!identity.is_valid());
        assert!(identity.user().is_none());

        let err = accounts.refresh(&session.refresh_token).await.unwrap_err();
        assert_eq!(err.public_code(), "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_update_password() {
        let accounts = service(Arc::new(MockUserStorage::new()));
        let session = accounts
            .sign_up("ada@example.com", "old", None, None)
            .await
            .unwrap();

        accounts
            .update_password(&session.user.id, "new")
            .await
            .unwrap();

        assert!(accounts.login("ada@example.com", "old", None).await.is_err());
        assert!(accounts.login("ada@example.com", "new", None).await.is_ok());

        let err = accounts
            .update_password(&session.user.id, "")
            .await
            .unwrap_err();
        assert_eq!(err.public_code(), "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_logout_removes_only_labelled_sessions() {
        let store = Arc::new(MockUserStorage::new());
        let accounts = service(store.clone());
        let phone = accounts
            .sign_up("ada@example.com", "pw", None, Some("phone"))
            .await
            .unwrap();
        let laptop = accounts
            .login("ada@example.com", "pw", Some("laptop"))
            .await
            .unwrap();
        assert_ne!(phone.refresh_token, laptop.refresh_token);

        let removed = accounts.logout(&phone.user.id, "phone").await.unwrap();
        assert_eq!(removed, 1);

        let err = accounts.refresh(&phone.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenNotRecognized));
        assert!(accounts.refresh(&laptop.refresh_token).await.is_ok());

        // logging the phone back in does not revive its old token
        let again = accounts
            .login("ada@example.com", "pw", Some("phone"))
            .await
            .unwrap();
        assert_ne!(again.refresh_token, phone.refresh_token);
        let err = accounts.refresh(&phone.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenNotRecognized));
    }

    #[tokio::test]
    async fn test_list_users_hides_secrets() {
        let accounts = service(Arc::new(MockUserStorage::new()));
        accounts
            .sign_up("ada@example.com", "pw", None, None)
            .await
            .unwrap();
        accounts
            .sign_up("bob@example.com", "pw", None, None)
            .await
            .unwrap();

        let users = accounts.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        let json = serde_json::to_string(&users).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
