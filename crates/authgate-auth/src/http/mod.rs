//! HTTP surface for account operations.
//!
//! [`auth_router`] mounts every endpoint behind the authentication gate:
//!
//! | Method & path | Operation | Gated |
//! |---|---|---|
//! | `POST /auth/users` | `createUser` | no |
//! | `POST /auth/login` | `login` | no |
//! | `POST /auth/token/validate` | `validateToken` | no |
//! | `POST /auth/token/refresh` | `refreshToken` | no |
//! | `PATCH /auth/me` | `updateUser` | yes |
//! | `POST /auth/me/deactivate` | `deactivateUser` | yes |
//! | `POST /auth/logout` | `logout` | yes |
//! | `GET /auth/users` | `users` | yes |

pub mod handlers;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{patch, post},
};

use crate::middleware::{AuthState, authenticate};

pub use handlers::{
    AuthUserPayload, CreateUserInput, LoginInput, LogoutInput, LogoutPayload, RefreshTokenInput,
    UpdateUserInput, ValidateTokenInput, ValidateTokenPayload, create_user_handler,
    deactivate_user_handler, login_handler, logout_handler, operation, refresh_token_handler,
    update_user_handler, users_handler, validate_token_handler,
};

/// Builds the account router with the authentication gate applied.
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/users", post(create_user_handler).get(users_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/token/validate", post(validate_token_handler))
        .route("/auth/token/refresh", post(refresh_token_handler))
        .route("/auth/me", patch(update_user_handler))
        .route("/auth/me/deactivate", post(deactivate_user_handler))
        .route("/auth/logout", post(logout_handler))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}
