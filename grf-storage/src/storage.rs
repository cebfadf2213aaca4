//! The asset orchestrator: one lookup chain over cache, overlay,
//! index, mapping, and archives.

use encoding_rs::Encoding;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use grf_format::{GrfArchive, GrfError};

use crate::cache::{AssetCache, CacheStats};
use crate::config::StorageConfig;
use crate::encoding::resolve_label;
use crate::error::{Result, StorageError};
use crate::index::FileIndex;
use crate::index_cache::{PersistentIndex, stack_digest};
use crate::local::LocalOverlay;
use crate::manifest::DataManifest;
use crate::mapping::{MappingStats, PathMapping};
use crate::paths::{latin1_bytes, normalize};

/// Aggregated storage counters for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub archives: usize,
    pub indexed_keys: usize,
    pub local_files: usize,
    pub requests: u64,
    pub not_found: u64,
    pub archive_errors: u64,
    pub cache: Option<CacheStats>,
    pub mapping: MappingStats,
}

/// Read-only asset storage over a local overlay and stacked archives.
///
/// Built once at startup; after that only the cache mutates, so
/// `get_asset` can run from any number of request workers.
pub struct AssetStorage {
    config: StorageConfig,
    archives: Vec<GrfArchive>,
    index: FileIndex,
    mapping: PathMapping,
    cache: Option<AssetCache>,
    overlay: LocalOverlay,
    requests: AtomicU64,
    not_found: AtomicU64,
    archive_errors: AtomicU64,
}

impl AssetStorage {
    /// Load the manifest, open the archive stack, build (or restore)
    /// the index, and wire the caches.
    ///
    /// Configuration faults are fatal here. A present-but-corrupt
    /// archive is skipped with a warning; startup proceeds as long as
    /// at least one manifest archive loads.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let manifest = DataManifest::load(&config.manifest_path())?;
        let encoding = resolve_label(&config.grf_encoding)?;

        let mut archives = Vec::with_capacity(manifest.archives.len());
        for name in &manifest.archives {
            let path = config.resource_path.join(name);
            if !path.is_file() {
                return Err(StorageError::MissingArchive(path));
            }
            match GrfArchive::open(&path) {
                Ok(archive) => {
                    info!(
                        archive = %path.display(),
                        entries = archive.entry_count(),
                        "loaded archive"
                    );
                    archives.push(archive);
                }
                Err(e) => {
                    warn!(archive = %path.display(), error = %e, "skipping unloadable archive");
                }
            }
        }
        if archives.is_empty() && !manifest.archives.is_empty() {
            return Err(StorageError::NoUsableArchives);
        }

        let index = Self::build_index(&config, &archives, encoding);
        info!(keys = index.len(), archives = archives.len(), "file index ready");

        let mapping = if config.path_mapping_enabled {
            let path = resolve_under(&config.resource_path, &config.path_mapping_file);
            let mapping = PathMapping::load(&path)?;
            info!(entries = mapping.len(), "path mapping loaded");
            mapping
        } else {
            PathMapping::empty()
        };

        let mut overlay = LocalOverlay::new(&config.resource_path);
        if config.local_scan {
            let files = overlay.scan()?;
            info!(files, "local overlay scanned");
        }

        let cache = config
            .cache_enabled
            .then(|| AssetCache::new(config.cache_max_items, config.cache_max_bytes));

        if let Some(limit) = config.memory_limit {
            info!(limit, "memory limit configured (advisory)");
        }

        Ok(Self {
            config,
            archives,
            index,
            mapping,
            cache,
            overlay,
            requests: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            archive_errors: AtomicU64::new(0),
        })
    }

    fn build_index(
        config: &StorageConfig,
        archives: &[GrfArchive],
        encoding: &'static Encoding,
    ) -> FileIndex {
        if !config.index_cache_enabled {
            return FileIndex::build(archives, encoding);
        }

        let paths: Vec<PathBuf> = archives.iter().map(|a| a.path().to_path_buf()).collect();
        let digest = stack_digest(&config.grf_encoding, &paths);
        let persistent =
            PersistentIndex::new(resolve_under(&config.resource_path, &config.index_cache_dir));

        if let Some(index) = persistent.load(&digest) {
            info!(keys = index.len(), "file index restored from cache");
            return index;
        }

        let index = FileIndex::build(archives, encoding);
        if let Err(e) = persistent.save(&digest, &index) {
            warn!(error = %e, "failed to persist file index");
        }
        index
    }

    /// Resolve one asset. `None` is the soft miss; entry-level archive
    /// faults are logged and counted but also surface as `None`.
    pub fn get_asset(&self, path: &str) -> Option<Arc<Vec<u8>>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let normalized = normalize(path);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&normalized) {
                debug!(key = %normalized, "cache hit");
                return Some(hit);
            }
        }

        if let Some(data) = self.overlay.read(path) {
            let data = Arc::new(data);
            self.cache_put(&normalized, &data);
            return Some(data);
        }

        if let Some(data) = self.read_indexed(&normalized) {
            return Some(self.finish_archive_hit(&normalized, data));
        }

        if let Some(mapped) = self.mapping.resolve(&normalized) {
            debug!(key = %normalized, mapped, "retrying via path mapping");
            if let Some(data) = self.read_indexed(&normalize(mapped)) {
                return Some(self.finish_archive_hit(&normalized, data));
            }
            if let Some(bytes) = latin1_bytes(mapped) {
                if let Some(data) = self.read_linear(&bytes) {
                    return Some(self.finish_archive_hit(&normalized, data));
                }
            }
        }

        if let Some(data) = self.read_linear(path.as_bytes()) {
            return Some(self.finish_archive_hit(&normalized, data));
        }

        self.not_found.fetch_add(1, Ordering::Relaxed);
        debug!(key = %normalized, "asset not found");
        None
    }

    /// Search the index keys and the scanned overlay listing.
    pub fn search(&self, pattern: &Regex) -> Vec<String> {
        let mut matches: Vec<String> = self
            .index
            .keys()
            .filter(|key| pattern.is_match(key))
            .map(str::to_string)
            .collect();
        matches.extend(
            self.overlay
                .listing()
                .iter()
                .filter(|path| pattern.is_match(path))
                .cloned(),
        );
        matches.sort();
        matches.dedup();
        matches
    }

    /// Walk every indexed key and attempt extraction, returning the
    /// keys that fail. Misses through the lookup chain are failures
    /// here: the index claimed the key exists.
    pub fn verify(&self) -> Vec<String> {
        info!(keys = self.index.len(), "verifying indexed entries");
        let mut failed: Vec<String> = self
            .index
            .keys()
            .filter(|key| self.read_indexed(key).is_none())
            .map(str::to_string)
            .collect();
        failed.sort();
        if failed.is_empty() {
            info!("verification complete, all entries extract");
        } else {
            warn!(failed = failed.len(), "verification found broken entries");
        }
        failed
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            archives: self.archives.len(),
            indexed_keys: self.index.len(),
            local_files: self.overlay.listing().len(),
            requests: self.requests.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            archive_errors: self.archive_errors.load(Ordering::Relaxed),
            cache: self.cache.as_ref().map(AssetCache::stats),
            mapping: self.mapping.stats(),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn read_indexed(&self, key: &str) -> Option<Vec<u8>> {
        let entry = self.index.lookup(key)?;
        let archive = self.archives.get(usize::from(entry.archive_id))?;
        match archive.read_entry(&entry.stored_name) {
            Ok(data) => Some(data),
            Err(GrfError::EntryNotFound(name)) => {
                debug!(key, name = %name, "indexed entry vanished from archive");
                None
            }
            Err(e) => {
                self.archive_errors.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %e, "entry extraction failed");
                None
            }
        }
    }

    /// Byte-exact sweep across the whole stack, for names the index
    /// cannot represent.
    fn read_linear(&self, stored_name: &[u8]) -> Option<Vec<u8>> {
        for archive in &self.archives {
            match archive.read_entry(stored_name) {
                Ok(data) => return Some(data),
                Err(GrfError::EntryNotFound(_)) => continue,
                Err(e) => {
                    self.archive_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(archive = %archive.path().display(), error = %e, "entry extraction failed");
                }
            }
        }
        None
    }

    fn finish_archive_hit(&self, normalized: &str, data: Vec<u8>) -> Arc<Vec<u8>> {
        if self.config.auto_extract {
            if let Err(e) = self.overlay.write(normalized, &data) {
                warn!(key = normalized, error = %e, "auto-extract failed");
            }
        }
        let data = Arc::new(data);
        self.cache_put(normalized, &data);
        data
    }

    fn cache_put(&self, key: &str, data: &Arc<Vec<u8>>) {
        if let Some(cache) = &self.cache {
            cache.set(key, Arc::clone(data));
        }
    }
}

/// Resolve a configured path under `base` unless it is absolute.
fn resolve_under(base: &std::path::Path, configured: &std::path::Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        base.join(configured)
    }
}
