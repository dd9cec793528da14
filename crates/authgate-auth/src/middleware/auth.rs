//! Request authentication gate and extractor.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware::from_fn_with_state, routing::get};
//! use authgate_auth::middleware::{AuthState, RequireAuth, authenticate};
//!
//! async fn me(RequireAuth(auth): RequireAuth) -> String {
//!     auth.user_id.to_string()
//! }
//!
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .layer(from_fn_with_state(state.clone(), authenticate))
//!     .with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::account::AccountService;
use crate::error::AuthError;
use crate::types::token_fingerprint;

use super::types::Authenticated;

// =============================================================================
// Auth State
// =============================================================================

/// Shared state for the gate and the HTTP handlers.
#[derive(Clone)]
pub struct AuthState {
    /// Account operations, including the credential validator.
    pub accounts: Arc<AccountService>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(accounts: AccountService) -> Self {
        Self {
            accounts: Arc::new(accounts),
        }
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Marks a request whose credentials could not be checked because a
/// dependency failed.
#[derive(Debug, Clone, Copy)]
struct CredentialCheckFailed;

/// Authentication gate middleware.
///
/// Reads the `Authorization` header (`Bearer <token>` or a bare token). When
/// absent, or when the token does not validate, the request proceeds
/// unauthenticated. When it validates, an [`Authenticated`] is inserted into
/// the request extensions. When validation itself fails, the request still
/// proceeds but [`RequireAuth`] rejects it with an internal error.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().remove::<Authenticated>();
    request.extensions_mut().remove::<CredentialCheckFailed>();

    if let Some(token) = extract_token(request.headers()).map(ToString::to_string) {
        match state.accounts.validator().validate_token(&token).await {
            Ok(identity) => {
                if let Some((user, claims)) = identity.into_parts() {
                    tracing::debug!(user_id = %user.id, "Request authenticated");
                    request
                        .extensions_mut()
                        .insert(Authenticated::new(user.id, claims));
                }
            }
            Err(e) => {
                tracing::error!(
                    token = %token_fingerprint(&token),
                    error = %e,
                    "Credential validation failed, proceeding unauthenticated"
                );
                request.extensions_mut().insert(CredentialCheckFailed);
            }
        }
    }

    next.run(request).await
}

/// Extracts the presented token from the `Authorization` header.
///
/// Accepts `Bearer <token>` (scheme case-insensitive) or a bare token.
#[must_use]
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();

    let token = match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };

    (!token.is_empty()).then_some(token)
}

// =============================================================================
// Require Auth Extractor
// =============================================================================

/// Axum extractor for gated operations.
///
/// Yields the identity attached by [`authenticate`]. Rejects with
/// `AuthError::Internal` if the gate could not check the credentials, and
/// with `AuthError::Unauthenticated` otherwise.
pub struct RequireAuth(pub Authenticated);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<Authenticated>() {
            return Ok(RequireAuth(auth.clone()));
        }
        if parts.extensions.get::<CredentialCheckFailed>().is_some() {
            return Err(AuthError::internal("credential validation failed"));
        }
        Err(AuthError::unauthenticated("no authenticated identity"))
    }
}

// =============================================================================
// Tests
// =============================================================================
