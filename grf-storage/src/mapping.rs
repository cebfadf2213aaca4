//! Path-mapping document: UTF-8 request paths to legacy stored names.
//!
//! The document is generated offline by scanning archives for
//! non-UTF-8 filenames; at runtime it is loaded once and read-only.
//! Values are the stored bytes as seen through Latin-1, so they can be
//! turned back into byte-exact archive names.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::paths::normalize;

/// Lookup counters for observability.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingStats {
    pub entries: usize,
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
pub struct PathMapping {
    entries: HashMap<String, String>,
    lookups: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PathMapping {
    /// An empty mapping; every resolve misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the JSON document at `path`. Both `{ "paths": { .. } }`
    /// and a flat object at top level are accepted; keys are
    /// normalized on insert.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|e| StorageError::Mapping {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let value: serde_json::Value =
            serde_json::from_slice(&raw).map_err(|e| StorageError::Mapping {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let object = match value.get("paths") {
            Some(paths) => paths,
            None => &value,
        };
        let object = object.as_object().ok_or_else(|| StorageError::Mapping {
            path: path.to_path_buf(),
            reason: "expected a JSON object of path pairs".to_string(),
        })?;

        let mut entries = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let Some(value) = value.as_str() else {
                return Err(StorageError::Mapping {
                    path: path.to_path_buf(),
                    reason: format!("value for {key:?} is not a string"),
                });
            };
            entries.insert(normalize(key), value.to_string());
        }

        debug!(path = %path.display(), entries = entries.len(), "loaded path mapping");
        Ok(Self {
            entries,
            ..Self::default()
        })
    }

    /// Resolve a request path to its mapped stored name.
    ///
    /// Tries the normalized key, its lowercased form, and both
    /// slash-converted forms in order.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let normalized = normalize(path);
        let candidates = [
            normalized.clone(),
            normalized.to_lowercase(),
            normalized.replace('/', "\\"),
            normalized.replace('\\', "/"),
        ];
        for candidate in &candidates {
            if let Some(mapped) = self.entries.get(candidate) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(mapped.as_str());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> MappingStats {
        MappingStats {
            entries: self.entries.len(),
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_mapping(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_the_wrapped_document_shape() {
        let file = write_mapping(
            r#"{ "paths": { "data/유저인터페이스/logo.bmp": "data/À¯ÀúÀÎÅÍÆäÀÌ½º/logo.bmp" } }"#,
        );
        let mapping = PathMapping::load(file.path()).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(
            mapping.resolve("data/유저인터페이스/logo.bmp"),
            Some("data/À¯ÀúÀÎÅÍÆäÀÌ½º/logo.bmp")
        );
    }

    #[test]
    fn loads_the_flat_document_shape() {
        let file = write_mapping(r#"{ "a/b.txt": "x\\y.txt" }"#);
        let mapping = PathMapping::load(file.path()).unwrap();
        assert_eq!(mapping.resolve("a/b.txt"), Some("x\\y.txt"));
    }

    #[test]
    fn keys_are_normalized_on_insert() {
        let file = write_mapping(r#"{ "DATA\\UI\\Logo.BMP": "data\\ui\\ÀÌ.bmp" }"#);
        let mapping = PathMapping::load(file.path()).unwrap();
        assert!(mapping.resolve("data/ui/logo.bmp").is_some());
        assert!(mapping.resolve("/DATA/UI/LOGO.BMP").is_some());
    }

    #[test]
    fn counters_track_hits_and_misses() {
        let file = write_mapping(r#"{ "a.txt": "b.txt" }"#);
        let mapping = PathMapping::load(file.path()).unwrap();
        mapping.resolve("a.txt");
        mapping.resolve("missing.txt");
        mapping.resolve("a.txt");

        let stats = mapping.stats();
        assert_eq!(stats.lookups, 3);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn non_string_values_are_rejected() {
        let file = write_mapping(r#"{ "a.txt": 42 }"#);
        assert!(matches!(
            PathMapping::load(file.path()),
            Err(StorageError::Mapping { .. })
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let file = write_mapping("{ nope");
        assert!(PathMapping::load(file.path()).is_err());
    }
}
