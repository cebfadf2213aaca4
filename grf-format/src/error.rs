//! Error types for GRF archive parsing and extraction.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Not a GRF archive (unrecognized signature)")]
    InvalidSignature,

    #[error("Unsupported archive version {0:#06x}")]
    UnsupportedVersion(u32),

    #[error("Archive truncated: wanted {wanted} bytes at offset {offset}")]
    Truncated { offset: u64, wanted: usize },

    #[error("Directory table decompression failed: {0}")]
    TableDecompression(String),

    #[error("Directory table size mismatch: expected {expected}, inflated {actual}")]
    TableSizeMismatch { expected: u32, actual: usize },

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Unknown entry flag {0:#04x}")]
    UnknownEntryFlag(u8),

    #[error("Invalid entry record for {name}: {reason}")]
    InvalidEntry { name: String, reason: String },

    #[error("Payload decompression failed: {0}")]
    Decompression(String),

    #[error("Payload size mismatch: expected {expected}, inflated {actual}")]
    SizeMismatch { expected: u32, actual: usize },

    #[error("Offset {0:#x} exceeds the platform address range")]
    OffsetOverflow(u64),
}

pub type Result<T> = std::result::Result<T, GrfError>;
