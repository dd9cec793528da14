//! Account endpoint handlers.
//!
//! Each handler reports failures as an [`OperationError`] carrying its
//! operation name, so error envelopes point at the operation that failed.

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::middleware::{AuthState, OperationError, RequireAuth};
use crate::session::IssuedSession;
use crate::storage::PublicUser;
use crate::token::ClaimSet;

/// Operation names reported in error paths.
pub mod operation {
    pub const CREATE_USER: &str = "createUser";
    pub const LOGIN: &str = "login";
    pub const VALIDATE_TOKEN: &str = "validateToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const UPDATE_USER: &str = "updateUser";
    pub const DEACTIVATE_USER: &str = "deactivateUser";
    pub const LOGOUT: &str = "logout";
    pub const USERS: &str = "users";
}

type HandlerResult<T> = Result<Json<T>, OperationError>;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Session label for the issued refresh token.
    #[serde(default)]
    pub session: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub session: Option<String>,
}

/// Explicit token validation request.
#[derive(Debug, Deserialize)]
pub struct ValidateTokenInput {
    pub token: String,
}

/// Refresh request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenInput {
    pub refresh_token: String,
}

/// Password change request.
#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub password: String,
}

/// Logout request. Without a session label the default label is used.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutInput {
    #[serde(default)]
    pub session: Option<String>,
}

/// A newly issued session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserPayload {
    pub token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

impl From<IssuedSession> for AuthUserPayload {
    fn from(session: IssuedSession) -> Self {
        Self {
            user: session.user.to_public(),
            token: session.access_token,
            refresh_token: session.refresh_token,
        }
    }
}

/// Outcome of explicit token validation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateTokenPayload {
    pub valid: bool,
    pub user: Option<PublicUser>,
    pub claims: Option<ClaimSet>,
}

/// Outcome of a logout.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutPayload {
    pub removed: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /auth/users`
pub async fn create_user_handler(
    State(state): State<AuthState>,
    body: Result<Json<CreateUserInput>, JsonRejection>,
) -> HandlerResult<AuthUserPayload> {
    let op = operation::CREATE_USER;
    let Json(input) = parse_body(op, body)?;

    let session = state
        .accounts
        .sign_up(
            &input.email,
            &input.password,
            input.name,
            input.session.as_deref(),
        )
        .await
        .map_err(|e| OperationError::new(op, e))?;

    Ok(Json(session.into()))
}

/// `POST /auth/login`
pub async fn login_handler(
    State(state): State<AuthState>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> HandlerResult<AuthUserPayload> {
    let op = operation::LOGIN;
    let Json(input) = parse_body(op, body)?;

    let session = state
        .accounts
        .login(&input.email, &input.password, input.session.as_deref())
        .await
        .map_err(|e| OperationError::new(op, e))?;

    Ok(Json(session.into()))
}

/// `POST /auth/token/validate`
pub async fn validate_token_handler(
    State(state): State<AuthState>,
    body: Result<Json<ValidateTokenInput>, JsonRejection>,
) -> HandlerResult<ValidateTokenPayload> {
    let op = operation::VALIDATE_TOKEN;
    let Json(input) = parse_body(op, body)?;

    let identity = state
        .accounts
        .validate_token(&input.token)
        .await
        .map_err(|e| OperationError::new(op, e))?;

    let payload = match identity.into_parts() {
        Some((user, claims)) => ValidateTokenPayload {
            valid: true,
            user: Some(user.to_public()),
            claims: Some(claims),
        },
        None => ValidateTokenPayload {
            valid: false,
            user: None,
            claims: None,
        },
    };

    Ok(Json(payload))
}

/// `POST /auth/token/refresh`
pub async fn refresh_token_handler(
    State(state): State<AuthState>,
    body: Result<Json<RefreshTokenInput>, JsonRejection>,
) -> HandlerResult<AuthUserPayload> {
    let op = operation::REFRESH_TOKEN;
    let Json(input) = parse_body(op, body)?;

    let session = state
        .accounts
        .refresh(&input.refresh_token)
        .await
        .map_err(|e| OperationError::new(op, e))?;

    Ok(Json(session.into()))
}

/// `PATCH /auth/me`
pub async fn update_user_handler(
    State(state): State<AuthState>,
    auth: Result<RequireAuth, AuthError>,
    body: Result<Json<UpdateUserInput>, JsonRejection>,
) -> HandlerResult<PublicUser> {
    let op = operation::UPDATE_USER;
    let RequireAuth(auth) = auth.map_err(|e| OperationError::new(op, e))?;
    let Json(input) = parse_body(op, body)?;

    let user = state
        .accounts
        .update_password(&auth.user_id, &input.password)
        .await
        .map_err(|e| OperationError::new(op, e))?;

    Ok(Json(user.to_public()))
}

/// `POST /auth/me/deactivate`
pub async fn deactivate_user_handler(
    State(state): State<AuthState>,
    auth: Result<RequireAuth, AuthError>,
) -> HandlerResult<PublicUser> {
    let op = operation::DEACTIVATE_USER;
    let RequireAuth(auth) = auth.map_err(|e| OperationError::new(op, e))?;

    let user = state
        .accounts
        .deactivate(&auth.user_id)
        .await
        .map_err(|e| OperationError::new(op, e))?;

    Ok(Json(user.to_public()))
}

/// `POST /auth/logout`
pub async fn logout_handler(
    State(state): State<AuthState>,
    auth: Result<RequireAuth, AuthError>,
    body: Bytes,
) -> HandlerResult<LogoutPayload> {
    let op = operation::LOGOUT;
    let RequireAuth(auth) = auth.map_err(|e| OperationError::new(op, e))?;
    let input: LogoutInput = if body.is_empty() {
        LogoutInput::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            OperationError::new(op, AuthError::invalid_request(format!("invalid body: {e}")))
        })?
    };

    let label = input
        .session
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.accounts.sessions().default_label().to_string());

    let removed = state
        .accounts
        .logout(&auth.user_id, &label)
        .await
        .map_err(|e| OperationError::new(op, e))?;

    Ok(Json(LogoutPayload { removed }))
}

/// `GET /auth/users`
pub async fn users_handler(
    State(state): State<AuthState>,
    auth: Result<RequireAuth, AuthError>,
) -> HandlerResult<Vec<PublicUser>> {
    let op = operation::USERS;
    auth.map_err(|e| OperationError::new(op, e))?;

    let users = state
        .accounts
        .list_users()
        .await
        .map_err(|e| OperationError::new(op, e))?;

    Ok(Json(users))
}

fn parse_body<T>(
    op: &'static str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<Json<T>, OperationError> {
    body.map_err(|rejection| {
        OperationError::new(op, AuthError::invalid_request(rejection.body_text()))
    })
}
