//! Signed-token payload.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The payload carried by every access and refresh token.
///
/// Immutable once constructed. Deserialization fails closed: a payload with a
/// missing, mistyped or extra field is rejected rather than defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimSet {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

impl ClaimSet {
    /// Creates a claim set from explicit timestamps (Unix seconds).
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        issued_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            iat: issued_at,
            exp: expires_at,
        }
    }

    /// Creates a claim set issued at `now` and valid for `lifetime`.
    ///
    /// `exp - iat` equals the lifetime in whole seconds.
    #[must_use]
    pub fn issue(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        now: OffsetDateTime,
        lifetime: Duration,
    ) -> Self {
        let iat = now.unix_timestamp();
        let secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        Self::new(issuer, subject, iat, iat.saturating_add(secs))
    }

    /// Issuer (`iss`).
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.iss
    }

    /// Subject (`sub`).
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Issued-at (`iat`), Unix seconds.
    #[must_use]
    pub fn issued_at(&self) -> i64 {
        self.iat
    }

    /// Expires-at (`exp`), Unix seconds.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.exp
    }

    /// Seconds between issue and expiry, saturating at the `i64` bounds.
    #[must_use]
    pub fn lifetime_secs(&self) -> i64 {
        self.exp.saturating_sub(self.iat)
    }

    /// Returns `true` if the claim set is at or past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
