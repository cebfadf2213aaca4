//! HTTP front-end for the GRF asset storage.
//!
//! Serves whitelisted top-level directories of the merged asset tree:
//! MIME from the extension, strong ETags with `If-None-Match` support,
//! response compression, plus search, health, and stats endpoints.

pub mod config;
pub mod error;
pub mod http;
pub mod mime;
pub mod missing;
pub mod server;

pub use config::ServerConfig;
pub use error::{ConfigError, ServerError};
pub use server::{AppState, Server};
