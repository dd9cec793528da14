//! Session issuing and refresh-token rotation.

pub mod service;

pub use service::{IssuedSession, SessionService};
