//! Account operations built on the credential lifecycle.

pub mod service;

pub use service::AccountService;
