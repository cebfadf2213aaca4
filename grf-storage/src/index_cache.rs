//! Persistent, digest-keyed cache of the built file index.
//!
//! The digest covers the configured encoding plus every loaded
//! archive's path, modification time, and size, so any archive change
//! invalidates the blob. Loading is silent about every failure mode:
//! a missing, unreadable, corrupt, or stale blob just means the caller
//! rebuilds the index.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

use crate::error::Result;
use crate::index::FileIndex;

const BLOB_NAME: &str = "file-index.json";

#[derive(Serialize, Deserialize)]
struct IndexBlob {
    digest: String,
    index: FileIndex,
}

/// On-disk index cache rooted at one directory.
pub struct PersistentIndex {
    dir: PathBuf,
}

impl PersistentIndex {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn blob_path(&self) -> PathBuf {
        self.dir.join(BLOB_NAME)
    }

    /// Load the cached index if its digest matches `expected`.
    pub fn load(&self, expected: &str) -> Option<FileIndex> {
        let path = self.blob_path();
        let raw = std::fs::read(&path).ok()?;
        let blob: IndexBlob = match serde_json::from_slice(&raw) {
            Ok(blob) => blob,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "discarding unreadable index blob");
                return None;
            }
        };
        if blob.digest != expected {
            debug!(
                path = %path.display(),
                stored = %blob.digest,
                expected,
                "index blob digest mismatch"
            );
            return None;
        }
        Some(blob.index)
    }

    /// Atomically persist the index under `digest`.
    pub fn save(&self, digest: &str, index: &FileIndex) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let blob = IndexBlob {
            digest: digest.to_string(),
            index: index.clone(),
        };
        let encoded = serde_json::to_vec(&blob).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        let tmp = self.dir.join(format!("{BLOB_NAME}.tmp"));
        std::fs::write(&tmp, &encoded)?;
        std::fs::rename(&tmp, self.blob_path())?;
        debug!(dir = %self.dir.display(), bytes = encoded.len(), "saved index blob");
        Ok(())
    }
}

/// Stable digest over the archive stack: the configured encoding label
/// plus each archive's path, mtime, and size in load order.
pub fn stack_digest(encoding_label: &str, archive_paths: &[PathBuf]) -> String {
    let mut canonical = format!("encoding={encoding_label}\n");
    for path in archive_paths {
        let (mtime, size) = match std::fs::metadata(path) {
            Ok(meta) => {
                let mtime = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_nanos())
                    .unwrap_or(0);
                (mtime, meta.len())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "archive unreadable while digesting");
                (0, 0)
            }
        };
        canonical.push_str(&format!("{}|{mtime}|{size}\n", path.display()));
    }
    hex::encode(md5::compute(canonical.as_bytes()).0)
}
