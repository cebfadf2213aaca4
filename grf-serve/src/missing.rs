//! Missing-files log: every unique not-found path, once.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MissingStats {
    pub unique: usize,
    pub total: u64,
}

/// Records not-found request paths for observability. A path is
/// logged the first time it misses; repeats only bump the counter.
#[derive(Default)]
pub struct MissingLog {
    seen: Mutex<HashSet<String>>,
    total: AtomicU64,
}

impl MissingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, normalized_path: &str) {
        self.total.fetch_add(1, Ordering::Relaxed);
        let mut seen = self.seen.lock();
        if seen.insert(normalized_path.to_string()) {
            info!(target: "missing_files", path = normalized_path, "asset not found");
        }
    }

    pub fn stats(&self) -> MissingStats {
        MissingStats {
            unique: self.seen.lock().len(),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}
