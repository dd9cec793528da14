//! Token construction, signing and verification.
//!
//! - [`ClaimSet`] - the signed payload (`iss`, `sub`, `iat`, `exp`)
//! - [`JwtService`] - HS256 encode/decode with a strict algorithm allow-list

pub mod claims;
pub mod jwt;

pub use claims::ClaimSet;
pub use jwt::{JwtError, JwtService};
