//! # authgate-auth
//!
//! Credential lifecycle for authgate.
//!
//! This crate provides:
//! - Signed access/refresh tokens (HS256, strict algorithm allow-list)
//! - Credential validation against the user directory
//! - Session issuing and refresh-token rotation
//! - Account operations (sign-up, login, password change, deactivation, logout)
//! - Axum request gate and HTTP handlers
//!
//! ## Modules
//!
//! - [`config`] - Issuer, signing secret, lifetimes and store bounds
//! - [`token`] - Claim sets and token encoding/decoding
//! - [`credentials`] - Credential validator and password hashing
//! - [`session`] - Session issuer and refresh rotator
//! - [`account`] - Account operations
//! - [`storage`] - Directory store trait
//! - [`middleware`] - Request gate, extractor and error rendering
//! - [`http`] - Axum handlers and router

pub mod account;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod middleware;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use account::AccountService;
pub use config::{AuthConfig, ConfigError};
pub use credentials::{AuthenticatedIdentity, CredentialValidator};
pub use error::{AuthError, ErrorCategory};
pub use http::auth_router;
pub use middleware::{AuthState, Authenticated, OperationError, RequireAuth, authenticate};
pub use session::{IssuedSession, SessionService};
pub use storage::{BoundedUserStorage, NewUser, PublicUser, User, UserStorage, UserUpdate};
pub use token::{ClaimSet, JwtError, JwtService};
pub use types::{RefreshRecord, UserId, token_fingerprint};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use authgate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::account::AccountService;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::credentials::{AuthenticatedIdentity, CredentialValidator};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::middleware::{AuthState, Authenticated, RequireAuth};
    pub use crate::session::{IssuedSession, SessionService};
    pub use crate::storage::{NewUser, PublicUser, User, UserStorage, UserUpdate};
    pub use crate::token::{ClaimSet, JwtService};
    pub use crate::types::{RefreshRecord, UserId};
}
