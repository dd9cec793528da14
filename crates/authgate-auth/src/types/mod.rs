//! Core domain types for the credential lifecycle.

pub mod refresh_record;
pub mod user_id;

pub use refresh_record::{RefreshRecord, token_fingerprint};
pub use user_id::{USER_ID_LEN, UserId, UserIdParseError};
