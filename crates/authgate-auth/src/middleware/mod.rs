//! HTTP middleware for authentication.
//!
//! - [`authenticate`] - the request gate, attaches [`Authenticated`] when a
//!   presented token validates
//! - [`RequireAuth`] - extractor for gated operations
//! - error rendering for [`AuthError`](crate::AuthError) and [`OperationError`]

pub mod auth;
pub mod error;
pub mod types;

pub use auth::{AuthState, RequireAuth, authenticate, extract_token};
pub use error::{OperationError, error_body, status_for};
pub use types::Authenticated;
