//! Credential validation.
//!
//! The trust boundary between "a correctly signed, unexpired token" and "an
//! authenticated identity". Used by the request gate and by the explicit
//! token validation operation; both go through [`CredentialValidator`].

use std::sync::Arc;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::storage::{BoundedUserStorage, User, UserStorage};
use crate::token::{ClaimSet, JwtService};
use crate::types::{UserId, token_fingerprint};

/// Result of validating a credential.
///
/// An invalid identity never carries a user or claims.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    user: Option<User>,
    claims: Option<ClaimSet>,
}

impl AuthenticatedIdentity {
    /// A successfully resolved identity.
    #[must_use]
    pub fn valid(user: User, claims: ClaimSet) -> Self {
        Self {
            user: Some(user),
            claims: Some(claims),
        }
    }

    /// The rejected identity.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            user: None,
            claims: None,
        }
    }

    /// Returns `true` if the credential resolved to an active user.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.user.is_some()
    }

    /// The resolved user, if valid.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The verified claims, if valid.
    #[must_use]
    pub fn claims(&self) -> Option<&ClaimSet> {
        self.claims.as_ref()
    }

    /// Consumes the identity, returning user and claims when valid.
    #[must_use]
    pub fn into_parts(self) -> Option<(User, ClaimSet)> {
        match (self.user, self.claims) {
            (Some(user), Some(claims)) => Some((user, claims)),
            _ => None,
        }
    }
}

/// Resolves verified claims to an active user.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    config: Arc<AuthConfig>,
    jwt: Arc<JwtService>,
    store: BoundedUserStorage,
}

impl CredentialValidator {
    /// Creates a new validator.
    #[must_use]
    pub fn new(config: Arc<AuthConfig>, jwt: Arc<JwtService>, store: BoundedUserStorage) -> Self {
        Self { config, jwt, store }
    }

    /// Validates decoded claims.
    ///
    /// A foreign issuer is rejected without touching the store. Unknown and
    /// inactive users produce the same invalid identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the subject of a correctly signed
    /// token is not a user id, or a storage error if the lookup fails.
    pub async fn validate(&self, claims: &ClaimSet) -> AuthResult<AuthenticatedIdentity> {
        if claims.issuer() != self.config.issuer {
            tracing::warn!(
                issuer = %claims.issuer(),
                "Rejected token from foreign issuer"
            );
            return Ok(AuthenticatedIdentity::invalid());
        }

        let user_id = parse_subject(claims)?;

        match self.store.find_active_by_id(&user_id).await? {
            Some(user) => Ok(AuthenticatedIdentity::valid(user, claims.clone())),
            None => {
                tracing::debug!(user_id = %user_id, "Token subject is unknown or inactive");
                Ok(AuthenticatedIdentity::invalid())
            }
        }
    }

    /// Decodes a presented token and validates its claims.
    ///
    /// Client-side failures (malformed, forged, expired) produce an invalid
    /// identity rather than an error.
    ///
    /// # Errors
    ///
    /// Same as [`CredentialValidator::validate`].
    pub async fn validate_token(&self, token: &str) -> AuthResult<AuthenticatedIdentity> {
        let claims = match self.jwt.decode(token) {
            Ok(claims) => claims,
            Err(e) if e.is_validation_error() => {
                tracing::debug!(
                    token = %token_fingerprint(token),
                    error = %e,
                    "Rejected access token"
                );
                return Ok(AuthenticatedIdentity::invalid());
            }
            Err(e) => return Err(e.into()),
        };

        self.validate(&claims).await
    }

    /// Returns the configured issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }
}

/// Parses the subject of a verified token.
pub(crate) fn parse_subject(claims: &ClaimSet) -> AuthResult<UserId> {
    UserId::parse(claims.subject()).map_err(|e| {
        tracing::error!(error = %e, "Verified token carries a malformed subject");
        AuthError::internal(format!("token subject is not a user id: {e}"))
    })
}
