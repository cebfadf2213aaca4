//! Storage configuration.

use std::path::PathBuf;

/// Configuration bundle for [`crate::AssetStorage`].
///
/// `resource_path` doubles as the local overlay root: files present
/// under it shadow archive content, and auto-extraction writes into it.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the archives and the data manifest.
    pub resource_path: PathBuf,
    /// Manifest filename inside `resource_path`.
    pub data_manifest: String,
    /// Materialize archive hits into the local overlay.
    pub auto_extract: bool,
    /// Scan the overlay directory at startup (feeds the search
    /// endpoint only).
    pub local_scan: bool,
    /// In-memory cache switch and bounds.
    pub cache_enabled: bool,
    pub cache_max_items: usize,
    pub cache_max_bytes: usize,
    /// Persistent index cache switch and location. A relative
    /// directory resolves under `resource_path`.
    pub index_cache_enabled: bool,
    pub index_cache_dir: PathBuf,
    /// Path-mapping switch and document location. A relative path
    /// resolves under `resource_path`.
    pub path_mapping_enabled: bool,
    pub path_mapping_file: PathBuf,
    /// Archive filename encoding label.
    pub grf_encoding: String,
    /// Process-wide memory cap in bytes, advisory.
    pub memory_limit: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            resource_path: PathBuf::from("resources"),
            data_manifest: "data.ini".to_string(),
            auto_extract: false,
            local_scan: false,
            cache_enabled: true,
            cache_max_items: 4096,
            cache_max_bytes: 256 * 1024 * 1024,
            index_cache_enabled: false,
            index_cache_dir: PathBuf::from("index-cache"),
            path_mapping_enabled: false,
            path_mapping_file: PathBuf::from("path_mapping.json"),
            grf_encoding: "CP949".to_string(),
            memory_limit: None,
        }
    }
}

impl StorageConfig {
    /// Absolute location of the data manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.resource_path.join(&self.data_manifest)
    }
}
