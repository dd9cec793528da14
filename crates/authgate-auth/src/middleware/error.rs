//! Error response rendering.
//!
//! Every error leaves the service in the same envelope:
//!
//! ```json
//! {"errors":[{"message":"Unauthorized","path":["refreshToken"],"extensions":{"code":"UNAUTHORIZED"}}]}
//! ```
//!
//! The message and code come from [`AuthError::public_message`] and
//! [`AuthError::public_code`]; the internal variant is only logged.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        error_response(&self, None)
    }
}

/// Error attributed to a named operation.
///
/// Rendered like [`AuthError`] with `path` set to the operation name.
#[derive(Debug)]
pub struct OperationError {
    /// Operation name reported in `path`.
    pub operation: &'static str,
    /// The underlying error.
    pub error: AuthError,
}

impl OperationError {
    /// Attributes `error` to `operation`.
    #[must_use]
    pub fn new(operation: &'static str, error: AuthError) -> Self {
        Self { operation, error }
    }
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        error_response(&self.error, Some(self.operation))
    }
}

/// HTTP status for an error's public code.
#[must_use]
pub fn status_for(error: &AuthError) -> StatusCode {
    match error.public_code() {
        "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
        "CONFLICT" => StatusCode::CONFLICT,
        "BAD_REQUEST" => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Builds the error envelope body.
#[must_use]
pub fn error_body(error: &AuthError, operation: Option<&str>) -> serde_json::Value {
    let path: Vec<&str> = operation.into_iter().collect();
    json!({
        "errors": [{
            "message": error.public_message(),
            "path": path,
            "extensions": { "code": error.public_code() }
        }]
    })
}

fn error_response(error: &AuthError, operation: Option<&str>) -> Response {
    let operation_name = operation.unwrap_or("-");
    if error.is_server_error() {
        tracing::error!(
            operation = operation_name,
            category = %error.category(),
            error = %error,
            "Request failed"
        );
    } else {
        tracing::debug!(
            operation = operation_name,
            category = %error.category(),
            error = %error,
            "Request rejected"
        );
    }

    let status = status_for(error);
    let mut response = (status, Json(error_body(error, operation))).into_response();

    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer realm=\"authgate\""),
        );
    }

    response
}

// =============================================================================
// Tests
// =============================================================================
