//! Storage traits for the user directory.
//!
//! The credential lifecycle never owns durable state. Users and their
//! outstanding refresh tokens live behind [`UserStorage`]; every call made by
//! the services goes through [`BoundedUserStorage`], which caps each call
//! with the configured store timeout.
//!
//! # Implementations
//!
//! - `authgate-db-memory` - in-memory backend

pub mod bounded;
pub mod user;

pub use bounded::BoundedUserStorage;
pub use user::{DEFAULT_ROLE, NewUser, PublicUser, User, UserStorage, UserUpdate};
