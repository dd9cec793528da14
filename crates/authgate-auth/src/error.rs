//! Authentication error types.
//!
//! The variants of [`AuthError`] form the internal taxonomy used for logging.
//! Callers outside the service only ever see the collapsed view returned by
//! [`AuthError::public_code`] and [`AuthError::public_message`], which never
//! distinguishes "expired" from "forged" or "wrong password" from "no such
//! account".

use std::fmt;

/// Errors that can occur during credential issuing, validation and rotation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token is empty or does not have the expected three-segment structure.
    #[error("Malformed token: {message}")]
    MalformedToken {
        /// Description of why the token could not be parsed.
        message: String,
    },

    /// The token signature does not verify, or the token advertises an
    /// algorithm other than the single accepted one.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token is at or past its expiry time.
    #[error("Token expired")]
    TokenExpired,

    /// The token was minted by a different issuer.
    #[error("Unknown issuer: {issuer}")]
    UnknownIssuer {
        /// The issuer found in the token.
        issuer: String,
    },

    /// The subject does not resolve to an active user.
    #[error("User not found or inactive")]
    UserNotFoundOrInactive,

    /// The presented refresh token is not among the user's stored records.
    #[error("Refresh token not recognized")]
    RefreshTokenNotRecognized,

    /// The store already lists this exact refresh token for the user.
    #[error("Refresh token already recorded")]
    DuplicateRefreshToken,

    /// Email/password authentication failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The operation requires an authenticated identity and none was attached.
    #[error("Unauthenticated: {message}")]
    Unauthenticated {
        /// Description of why the request is unauthenticated.
        message: String,
    },

    /// The resource already exists (e.g. duplicate registration).
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// The request is invalid or malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The directory store reported a failure.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The directory store did not answer in time.
    #[error("Storage unavailable: {operation} timed out")]
    Unavailable {
        /// The store operation that timed out.
        operation: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `MalformedToken` error.
    #[must_use]
    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::MalformedToken {
            message: message.into(),
        }
    }

    /// Creates a new `UnknownIssuer` error.
    #[must_use]
    pub fn unknown_issuer(issuer: impl Into<String>) -> Self {
        Self::UnknownIssuer {
            issuer: issuer.into(),
        }
    }

    /// Creates a new `Unauthenticated` error.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(operation: impl Into<String>) -> Self {
        Self::Unavailable {
            operation: operation.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the failure stems from client-supplied data.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken { .. }
                | Self::InvalidSignature
                | Self::TokenExpired
                | Self::UnknownIssuer { .. }
                | Self::UserNotFoundOrInactive
                | Self::RefreshTokenNotRecognized
                | Self::InvalidCredentials
                | Self::Unauthenticated { .. }
                | Self::Conflict { .. }
                | Self::InvalidRequest { .. }
        )
    }

    /// Returns `true` if the failure stems from the service's own dependencies.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. }
                | Self::Unavailable { .. }
                | Self::DuplicateRefreshToken
                | Self::Configuration { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns `true` if this error means "the presented credential is not acceptable".
    #[must_use]
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken { .. }
                | Self::InvalidSignature
                | Self::TokenExpired
                | Self::UnknownIssuer { .. }
                | Self::UserNotFoundOrInactive
                | Self::RefreshTokenNotRecognized
                | Self::InvalidCredentials
                | Self::Unauthenticated { .. }
        )
    }

    /// Returns the error category for logging.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedToken { .. } => ErrorCategory::Token,
            Self::InvalidSignature => ErrorCategory::Token,
            Self::TokenExpired => ErrorCategory::Token,
            Self::UnknownIssuer { .. } => ErrorCategory::Token,
            Self::UserNotFoundOrInactive => ErrorCategory::Authentication,
            Self::RefreshTokenNotRecognized => ErrorCategory::Token,
            Self::DuplicateRefreshToken => ErrorCategory::Infrastructure,
            Self::InvalidCredentials => ErrorCategory::Authentication,
            Self::Unauthenticated { .. } => ErrorCategory::Authentication,
            Self::Conflict { .. } => ErrorCategory::Validation,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Unavailable { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the externally visible error code.
    ///
    /// All credential failures collapse to `UNAUTHORIZED`, all dependency
    /// failures to `INTERNAL_SERVER_ERROR`.
    #[must_use]
    pub fn public_code(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => "CONFLICT",
            Self::InvalidRequest { .. } => "BAD_REQUEST",
            e if e.is_credential_error() => "UNAUTHORIZED",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Returns the externally visible message. Never carries internal detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Conflict { message } | Self::InvalidRequest { message } => message.clone(),
            e if e.is_credential_error() => "Unauthorized".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

/// Categories of authentication errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Identity verification failures.
    Authentication,
    /// Token structure, signature or lifetime failures.
    Token,
    /// Request validation errors.
    Validation,
    /// Directory store failures.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::malformed_token("expected three segments");
        assert_eq!(err.to_string(), "Malformed token: expected three segments");

        let err = AuthError::TokenExpired;
        assert_eq!(err.to_string(), "Token expired");

        let err = AuthError::unavailable("find_active_by_id");
        assert_eq!(
            err.to_string(),
            "Storage unavailable: find_active_by_id timed out"
        );
    }

    #[test]
    fn test_credential_failures_collapse_to_unauthorized() {
        let errors = [
            AuthError::malformed_token("x"),
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::unknown_issuer("https://evil.example"),
            AuthError::UserNotFoundOrInactive,
            AuthError::RefreshTokenNotRecognized,
            AuthError::InvalidCredentials,
            AuthError::unauthenticated("missing identity"),
        ];

        for err in errors {
            assert_eq!(err.public_code(), "UNAUTHORIZED", "{err}");
            assert_eq!(err.public_message(), "Unauthorized");
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn test_server_failures_hide_detail() {
        let err = AuthError::storage("connection refused to 10.0.0.3:27017");
        assert_eq!(err.public_code(), "INTERNAL_SERVER_ERROR");
        assert!(!err.public_message().contains("10.0.0.3"));
        assert!(err.is_server_error());

        let err = AuthError::DuplicateRefreshToken;
        assert_eq!(err.public_code(), "INTERNAL_SERVER_ERROR");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());

        let err = AuthError::internal("subject is not a user id");
        assert_eq!(err.public_code(), "INTERNAL_SERVER_ERROR");
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_conflict_and_bad_request_keep_message() {
        let err = AuthError::conflict("User already exists");
        assert_eq!(err.public_code(), "CONFLICT");
        assert_eq!(err.public_message(), "User already exists");

        let err = AuthError::invalid_request("email is required");
        assert_eq!(err.public_code(), "BAD_REQUEST");
        assert_eq!(err.public_message(), "email is required");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(AuthError::TokenExpired.category(), ErrorCategory::Token);
        assert_eq!(
            AuthError::InvalidCredentials.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::unavailable("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
