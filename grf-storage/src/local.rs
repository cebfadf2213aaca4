//! The local overlay directory.
//!
//! Files under the resource directory shadow archive content. Request
//! paths are resolved component-wise so a crafted path can never
//! escape the overlay root.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::paths::normalize;

pub struct LocalOverlay {
    root: PathBuf,
    listing: Vec<String>,
}

impl LocalOverlay {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            listing: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path onto the overlay, rejecting parent-directory
    /// components and absolute paths.
    fn resolve(&self, requested: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        for component in requested.split(['/', '\\']) {
            match component {
                "" | "." => continue,
                ".." => return None,
                name => resolved.push(name),
            }
        }
        Some(resolved)
    }

    /// Read a regular file at the requested path, if one exists.
    pub fn read(&self, requested: &str) -> Option<Vec<u8>> {
        let path = self.resolve(requested)?;
        let meta = fs::metadata(&path).ok()?;
        if !meta.is_file() {
            return None;
        }
        match fs::read(&path) {
            Ok(data) => {
                debug!(path = %path.display(), bytes = data.len(), "local overlay hit");
                Some(data)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "local overlay read failed");
                None
            }
        }
    }

    /// Materialize extracted archive content into the overlay.
    pub fn write(&self, requested: &str, data: &[u8]) -> std::io::Result<()> {
        let Some(path) = self.resolve(requested) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path escapes the overlay root",
            ));
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)
    }

    /// Walk the overlay once and record every file as a normalized
    /// relative path. Only the search endpoint consumes this list.
    pub fn scan(&mut self) -> std::io::Result<usize> {
        let mut listing = Vec::new();
        if self.root.is_dir() {
            walk(&self.root, &self.root, &mut listing)?;
        }
        listing.sort();
        debug!(root = %self.root.display(), files = listing.len(), "scanned local overlay");
        self.listing = listing;
        Ok(self.listing.len())
    }

    pub fn listing(&self) -> &[String] {
        &self.listing
    }
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, out)?;
        } else if path.is_file() {
            if let Ok(relative) = path.strip_prefix(root) {
                out.push(normalize(&relative.to_string_lossy()));
            }
        }
    }
    Ok(())
}
