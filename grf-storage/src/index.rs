//! The merged file index over the archive stack.

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use grf_format::GrfArchive;

use crate::encoding::decode_stored_name;
use crate::paths::normalize;

/// Where a normalized key resolves to: the archive (by load order) and
/// the exact name bytes stored in its directory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub archive_id: u16,
    pub stored_name: Vec<u8>,
}

/// Normalized-key lookup table across all loaded archives.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndex {
    entries: HashMap<String, IndexedEntry>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index by streaming every archive's entry list in
    /// manifest order. Later archives silently overwrite earlier ones
    /// on key collision, which encodes the overlay rule.
    pub fn build(archives: &[GrfArchive], encoding: &'static Encoding) -> Self {
        let mut index = Self::new();
        for (archive_id, archive) in archives.iter().enumerate() {
            let archive_id = archive_id as u16;
            for stored_name in archive.entries() {
                let key = normalize(&decode_stored_name(stored_name, encoding));
                index.entries.insert(
                    key,
                    IndexedEntry {
                        archive_id,
                        stored_name: stored_name.clone(),
                    },
                );
            }
            debug!(
                archive = %archive.path().display(),
                archive_id,
                total_keys = index.entries.len(),
                "indexed archive"
            );
        }
        index
    }

    /// Insert an entry under the normalized form of `key`.
    pub fn insert(&mut self, key: &str, entry: IndexedEntry) {
        self.entries.insert(normalize(key), entry);
    }

    /// Look up the normalized form of `path`.
    pub fn lookup(&self, path: &str) -> Option<&IndexedEntry> {
        self.entries.get(&normalize(path))
    }

    /// Iterate all normalized keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
