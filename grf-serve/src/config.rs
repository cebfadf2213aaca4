//! Server configuration from CLI arguments and environment variables.

use clap::{ArgAction, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;

use grf_storage::StorageConfig;

use crate::error::ConfigError;

/// Configuration for the asset server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "grf-serve",
    about = "Read-only HTTP asset server over GRF archive stacks",
    version
)]
pub struct ServerConfig {
    /// HTTP bind address
    #[arg(long, env = "GRF_SERVE_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Directory holding the archives and the data manifest
    #[arg(long, env = "GRF_SERVE_RESOURCE_PATH", default_value = "./resources")]
    pub resource_path: PathBuf,

    /// Manifest filename inside the resource directory
    #[arg(long, env = "GRF_SERVE_DATA_MANIFEST", default_value = "data.ini")]
    pub data_manifest: String,

    /// Comma-separated whitelist of servable top-level directories
    #[arg(
        long,
        env = "GRF_SERVE_WHITELIST",
        default_value = "data",
        value_delimiter = ','
    )]
    pub whitelist: Vec<String>,

    /// Materialize archive hits into the local overlay
    #[arg(long, env = "GRF_SERVE_AUTO_EXTRACT")]
    pub auto_extract: bool,

    /// Scan the local overlay at startup to feed the search endpoint
    #[arg(long, env = "GRF_SERVE_LOCAL_SCAN")]
    pub local_scan: bool,

    /// In-memory cache switch
    #[arg(
        long,
        env = "GRF_SERVE_CACHE_ENABLED",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub cache_enabled: bool,

    /// Cache entry bound
    #[arg(long, env = "GRF_SERVE_CACHE_MAX_ITEMS", default_value_t = 4096)]
    pub cache_max_items: usize,

    /// Cache byte bound
    #[arg(
        long,
        env = "GRF_SERVE_CACHE_MAX_BYTES",
        default_value_t = 256 * 1024 * 1024
    )]
    pub cache_max_bytes: usize,

    /// Persist the built file index between runs
    #[arg(long, env = "GRF_SERVE_INDEX_CACHE_ENABLED")]
    pub index_cache_enabled: bool,

    /// Index cache directory (relative paths resolve under the
    /// resource directory)
    #[arg(long, env = "GRF_SERVE_INDEX_CACHE_DIR", default_value = "index-cache")]
    pub index_cache_dir: PathBuf,

    /// Enable the legacy-encoding path mapping
    #[arg(long, env = "GRF_SERVE_PATH_MAPPING_ENABLED")]
    pub path_mapping_enabled: bool,

    /// Path-mapping document (relative paths resolve under the
    /// resource directory)
    #[arg(
        long,
        env = "GRF_SERVE_PATH_MAPPING_FILE",
        default_value = "path_mapping.json"
    )]
    pub path_mapping_file: PathBuf,

    /// Archive filename encoding
    #[arg(long, env = "GRF_SERVE_GRF_ENCODING", default_value = "CP949")]
    pub grf_encoding: String,

    /// Advisory process-wide memory cap in bytes
    #[arg(long, env = "GRF_SERVE_MEMORY_LIMIT")]
    pub memory_limit: Option<u64>,
}

impl ServerConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Validate configuration before startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resource_path.is_dir() {
            return Err(ConfigError::MissingResourcePath(self.resource_path.clone()));
        }
        let manifest = self.resource_path.join(&self.data_manifest);
        if !manifest.is_file() {
            return Err(ConfigError::MissingManifest(manifest));
        }
        if self.whitelist.iter().all(|dir| dir.trim().is_empty()) {
            return Err(ConfigError::EmptyWhitelist);
        }
        Ok(())
    }

    /// Lower into the storage configuration bundle.
    #[must_use]
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            resource_path: self.resource_path.clone(),
            data_manifest: self.data_manifest.clone(),
            auto_extract: self.auto_extract,
            local_scan: self.local_scan,
            cache_enabled: self.cache_enabled,
            cache_max_items: self.cache_max_items,
            cache_max_bytes: self.cache_max_bytes,
            index_cache_enabled: self.index_cache_enabled,
            index_cache_dir: self.index_cache_dir.clone(),
            path_mapping_enabled: self.path_mapping_enabled,
            path_mapping_file: self.path_mapping_file.clone(),
            grf_encoding: self.grf_encoding.clone(),
            memory_limit: self.memory_limit,
        }
    }

    /// Normalized whitelist entries (lowercase, no blanks).
    #[must_use]
    pub fn normalized_whitelist(&self) -> Vec<String> {
        self.whitelist
            .iter()
            .map(|dir| dir.trim().to_lowercase())
            .filter(|dir| !dir.is_empty())
            .collect()
    }
}
