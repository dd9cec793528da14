//! User identifier.
//!
//! Subjects in issued tokens are the hex rendering of a [`UserId`]. Parsing a
//! subject back into a `UserId` is strict: exactly 32 lowercase hexadecimal
//! characters, nothing else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of bytes in a user identifier.
pub const USER_ID_LEN: usize = 16;

/// Error returned when a string is not a valid user identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid user id '{value}': {reason}")]
pub struct UserIdParseError {
    value: String,
    reason: &'static str,
}

/// Opaque, hex-encoded user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId([u8; USER_ID_LEN]);

impl UserId {
    /// Generates a new random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Builds an identifier from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; USER_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; USER_ID_LEN] {
        &self.0
    }

    /// Parses the hex form produced by [`UserId::to_hex`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not exactly 32 lowercase hex characters.
    pub fn parse(value: &str) -> Result<Self, UserIdParseError> {
        if value.len() != USER_ID_LEN * 2 {
            return Err(UserIdParseError {
                value: value.to_string(),
                reason: "expected 32 hex characters",
            });
        }

        if value.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(UserIdParseError {
                value: value.to_string(),
                reason: "expected lowercase hex",
            });
        }

        let mut bytes = [0u8; USER_ID_LEN];
        hex::decode_to_slice(value, &mut bytes).map_err(|_| UserIdParseError {
            value: value.to_string(),
            reason: "not hexadecimal",
        })?;

        Ok(Self(bytes))
    }

    /// Returns the lowercase hex form used as token subject.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for UserId {
    type Err = UserIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let id = UserId::generate();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 32);
        assert_eq!(UserId::parse(&hex).unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(UserId::parse("").is_err());
        assert!(UserId::parse("u1").is_err());
        // 24-char object-id style identifiers are not accepted
        assert!(UserId::parse("5d470b3e98b0116d7d8ca48c").is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex_and_uppercase() {
        assert!(UserId::parse("zz470b3e98b0116d7d8ca48c00112233").is_err());
        assert!(UserId::parse("AB470B3E98B0116D7D8CA48C00112233").is_err());
        assert!(UserId::parse("ab470b3e-98b0-116d-7d8c-a48c0011").is_err());
    }

    #[test]
    fn test_generate_uniqueness() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = UserId::from_bytes([0xab; USER_ID_LEN]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(16)));

        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<UserId>("\"not-an-id\"").is_err());
    }
}
