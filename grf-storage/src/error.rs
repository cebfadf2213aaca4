//! Error types for storage construction and lookups.
//!
//! Only startup can fail loudly: configuration faults (bad manifest,
//! missing archives, unreadable mapping) abort before serving begins.
//! On the read path, not-found is `None` and per-entry archive faults
//! degrade to misses after being logged and counted.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed data manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    #[error("Archive listed in manifest does not exist: {0}")]
    MissingArchive(PathBuf),

    #[error("No archive in the manifest could be loaded")]
    NoUsableArchives,

    #[error("Unknown archive encoding label: {0}")]
    UnknownEncoding(String),

    #[error("Path mapping file {path}: {reason}")]
    Mapping { path: PathBuf, reason: String },

    #[error("Archive error: {0}")]
    Archive(#[from] grf_format::GrfError),
}

pub type Result<T> = std::result::Result<T, StorageError>;
