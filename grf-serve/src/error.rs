//! Error types for server configuration and runtime.

use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Resource directory not found: {0}")]
    MissingResourcePath(std::path::PathBuf),

    #[error("Data manifest not found: {0}")]
    MissingManifest(std::path::PathBuf),

    #[error("Directory whitelist is empty")]
    EmptyWhitelist,
}

/// Server runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    BindFailed {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] grf_storage::StorageError),

    #[error("Server shutdown error: {0}")]
    Shutdown(String),
}
