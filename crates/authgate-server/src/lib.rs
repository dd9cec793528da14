//! # authgate-server
//!
//! HTTP host for the authgate account and token endpoints.
//!
//! The binary loads [`AppConfig`] (TOML file overlaid by `AUTHGATE__*`
//! environment variables), initialises tracing and serves the router built
//! by [`build_app`].

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use observability::init_tracing;
pub use server::{AuthgateServer, ServerBuilder, build_app, build_app_with_storage};
