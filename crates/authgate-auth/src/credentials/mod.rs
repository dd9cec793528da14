//! Credential validation and password hashing.

pub mod password;
pub mod validator;

pub use password::{hash_password, verify_password};
pub use validator::{AuthenticatedIdentity, CredentialValidator};
