//! Refresh record domain type.
//!
//! A refresh record is the persisted half of a session: the refresh token
//! string handed to the client plus the label identifying which client
//! instance holds it. Records live in the user's document in the directory
//! store, in issue order.

use serde::{Deserialize, Serialize};

/// Refresh token stored in the user's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRecord {
    /// The serialized, signed refresh token.
    pub token: String,

    /// Session label distinguishing concurrent sessions of one user
    /// (e.g. the device name or browser).
    pub identifier: String,
}

impl RefreshRecord {
    /// Creates a new refresh record.
    #[must_use]
    pub fn new(token: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            identifier: identifier.into(),
        }
    }

    /// Returns `true` if this record holds exactly the presented token.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        self.token == presented
    }
}

/// Returns a short, non-reversible fingerprint of a token for log output.
///
/// The first 8 bytes of the SHA-256 digest, hex encoded.
#[must_use]
pub fn token_fingerprint(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_is_exact() {
        let record = RefreshRecord::new("a.b.c", "laptop");
        assert!(record.matches("a.b.c"));
        assert!(!record.matches("a.b.c "));
        assert!(!record.matches("a.b.C"));
        assert!(!record.matches(""));
    }

    #[test]
    fn test_token_fingerprint() {
        let fp = token_fingerprint("a.b.c");
        assert_eq!(fp.len(), 16);
        assert_eq!(fp, token_fingerprint("a.b.c"));
        assert_ne!(fp, token_fingerprint("a.b.d"));
        assert!(!fp.contains("a.b.c"));
    }

    #[test]
    fn test_serialization() {
        let record = RefreshRecord::new("tok", "phone");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["token"], "tok");
        assert_eq!(json["identifier"], "phone");
    }
}
