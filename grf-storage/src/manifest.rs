//! The INI-style data manifest naming the archive stack.
//!
//! A case-insensitive `[Data]` section maps integer priorities to
//! archive filenames. Ascending priority equals ascending precedence:
//! the archive with the highest key overrides everything before it.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, StorageError};

/// Ordered archive list from a data manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataManifest {
    /// Archive filenames, lowest priority first.
    pub archives: Vec<String>,
}

impl DataManifest {
    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| StorageError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let manifest = Self::parse(&text).map_err(|reason| StorageError::Manifest {
            path: path.to_path_buf(),
            reason,
        })?;
        debug!(path = %path.display(), archives = manifest.archives.len(), "parsed data manifest");
        Ok(manifest)
    }

    /// Parse manifest text. Lines outside `[Data]` are ignored, as are
    /// blank lines and `;`/`#` comments.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut in_data = false;
        let mut ordered = BTreeMap::new();

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                in_data = section.eq_ignore_ascii_case("data");
                continue;
            }
            if !in_data {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| format!("line {}: expected priority=filename", lineno + 1))?;
            let priority: i64 = key
                .trim()
                .parse()
                .map_err(|_| format!("line {}: priority {:?} is not an integer", lineno + 1, key.trim()))?;
            let value = value.trim();
            if value.is_empty() {
                return Err(format!("line {}: empty archive name", lineno + 1));
            }
            ordered.insert(priority, value.to_string());
        }

        Ok(Self {
            archives: ordered.into_values().collect(),
        })
    }
}
