//! Credential lifecycle configuration.
//!
//! The configuration is built once at startup, validated, and then shared
//! read-only (`Arc<AuthConfig>`) with every component that needs the issuer,
//! the signing secret or the token lifetimes.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The only signing algorithm this service issues or accepts.
pub const ACCEPTED_ALGORITHM: &str = "HS256";

/// Minimum length of the HMAC secret in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// issuer = "https://auth.example.com"
///
/// [auth.signing]
/// secret = "change-me-to-at-least-32-bytes-of-entropy"
///
/// [auth.tokens]
/// access_token_lifetime = "15m"
/// refresh_token_lifetime = "30d"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Canonical host identifier, written to and checked against the `iss` claim.
    pub issuer: String,

    /// Token signing configuration.
    pub signing: SigningConfig,

    /// Token lifetimes and rotation behaviour.
    pub tokens: TokenConfig,

    /// Directory store call bounds.
    pub store: StoreConfig,

    /// Session labelling.
    pub sessions: SessionConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            signing: SigningConfig::default(),
            tokens: TokenConfig::default(),
            store: StoreConfig::default(),
            sessions: SessionConfig::default(),
        }
    }
}

/// Token signing configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Pre-shared HMAC secret.
    pub secret: String,

    /// Signing algorithm. Only `HS256` is supported.
    pub algorithm: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: ACCEPTED_ALGORITHM.to_string(),
        }
    }
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Token lifetime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Replace the presented refresh token on rotation.
    /// When disabled, superseded refresh tokens stay listed and usable.
    pub refresh_token_rotation: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 3600), // 30 days
            refresh_token_rotation: true,
        }
    }
}

/// Directory store call configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upper bound for a single store call.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Session labelling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Label recorded with a refresh token when the client does not name its session.
    pub default_label: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_label: "unknown".to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Creates a configuration for the given issuer and secret with default lifetimes.
    #[must_use]
    pub fn new(issuer: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            signing: SigningConfig {
                secret: secret.into(),
                ..SigningConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the issuer or secret is empty, and
    /// `ConfigError::InvalidValue` if:
    /// - The secret is shorter than [`MIN_SECRET_LEN`] bytes
    /// - The signing algorithm is not `HS256`
    /// - A lifetime or the store timeout is zero
    /// - The refresh lifetime is not longer than the access lifetime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::Missing("issuer".to_string()));
        }

        if self.signing.secret.is_empty() {
            return Err(ConfigError::Missing("signing.secret".to_string()));
        }

        if self.signing.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "signing.secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        if self.signing.algorithm != ACCEPTED_ALGORITHM {
            return Err(ConfigError::InvalidValue(format!(
                "Invalid signing algorithm: '{}'. Must be {ACCEPTED_ALGORITHM}",
                self.signing.algorithm
            )));
        }

        if self.tokens.access_token_lifetime.as_secs() == 0 {
            return Err(ConfigError::InvalidValue(
                "tokens.access_token_lifetime must be at least one second".to_string(),
            ));
        }

        if self.tokens.refresh_token_lifetime <= self.tokens.access_token_lifetime {
            return Err(ConfigError::InvalidValue(
                "tokens.refresh_token_lifetime must be longer than tokens.access_token_lifetime"
                    .to_string(),
            ));
        }

        if self.store.timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "store.timeout must be > 0".to_string(),
            ));
        }

        if self.sessions.default_label.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "sessions.default_label cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
