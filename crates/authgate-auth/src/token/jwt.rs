//! HS256 token signing and verification.
//!
//! Tokens use the compact JWS form: three base64url segments (header,
//! payload, signature) joined by `.`. The header always declares `HS256` and
//! the payload is exactly a [`ClaimSet`].
//!
//! ## Algorithm allow-list
//!
//! Verification accepts exactly one algorithm. The header is inspected before
//! any cryptography runs, and a token advertising anything else (`none`,
//! `HS512`, `RS256`, ...) is rejected as [`JwtError::InvalidSignature`].
//!
//! ## Example
//!
//! ```ignore
//! use authgate_auth::token::{ClaimSet, JwtService};
//!
//! let jwt = JwtService::new(secret.as_bytes());
//! let token = jwt.encode(&claims)?;
//! let decoded = jwt.decode(&token)?;
//! ```

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use time::OffsetDateTime;

use super::claims::ClaimSet;
use crate::config::ACCEPTED_ALGORITHM;
use crate::error::AuthError;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while encoding or decoding a token.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// The token is empty or not parseable as the expected structure.
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of the structural problem.
        message: String,
    },

    /// Signature verification failed, or the token advertises a
    /// non-accepted algorithm.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token is at or past its expiry time.
    #[error("Token expired")]
    Expired,

    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Returns `true` if the error was caused by the presented token.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        !matches!(self, Self::Encoding { .. })
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::MissingAlgorithm => Self::InvalidSignature,
            _ => Self::malformed(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Malformed { message } => AuthError::malformed_token(message),
            JwtError::InvalidSignature => AuthError::InvalidSignature,
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::Encoding { message } => AuthError::internal(message),
        }
    }
}

/// The only header field inspected before verification.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

// ============================================================================
// JWT Service
// ============================================================================

/// Signs and verifies tokens with the process-wide HMAC secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Creates a new JWT service from the pre-shared secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked explicitly (at-or-past), issuer by the credential validator.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Encodes and signs a claim set.
    ///
    /// # Errors
    /// Returns an error if serialization or signing fails.
    pub fn encode(&self, claims: &ClaimSet) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key).map_err(|e| JwtError::encoding(e.to_string()))
    }

    /// Decodes and verifies a token against the current time.
    ///
    /// # Errors
    /// See [`JwtService::decode_at`].
    pub fn decode(&self, token: &str) -> Result<ClaimSet, JwtError> {
        self.decode_at(token, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Decodes and verifies a token as of `now` (Unix seconds).
    ///
    /// Claims are returned only after the structure, the algorithm, the
    /// signature and the expiry all check out.
    ///
    /// # Errors
    /// - `Malformed` if the token is empty, does not have three segments, or
    ///   its header or payload cannot be parsed
    /// - `InvalidSignature` if the algorithm is not `HS256` or the signature
    ///   does not verify
    /// - `Expired` if `now >= exp`
    pub fn decode_at(&self, token: &str, now: i64) -> Result<ClaimSet, JwtError> {
        check_header(token)?;

        let data = decode::<ClaimSet>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

impl fmt::Debug for JwtService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtService")
            .field("algorithm", &ACCEPTED_ALGORITHM)
            .finish_non_exhaustive()
    }
}

/// Structural pre-check and algorithm allow-list.
fn check_header(token: &str) -> Result<(), JwtError> {
    if token.is_empty() {
        return Err(JwtError::malformed("empty token"));
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(JwtError::malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }
    if segments[0].is_empty() || segments[1].is_empty() {
        return Err(JwtError::malformed("empty header or payload segment"));
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|e| JwtError::malformed(format!("header is not base64url: {e}")))?;
    let header: RawHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| JwtError::malformed(format!("header is not valid JSON: {e}")))?;

    if header.alg != ACCEPTED_ALGORITHM {
        tracing::warn!(alg = %header.alg, "Rejected token with non-accepted algorithm");
        return Err(JwtError::InvalidSignature);
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
