//! Reader for GRF container archives.
//!
//! A GRF file holds a 46-byte header, an arbitrarily large payload
//! region, and a zlib-compressed directory table describing every
//! stored entry. This crate parses versions 0x200 and 0x300, lists the
//! stored names, and extracts single entries on demand: positional
//! payload read, per-flag decryption through [`grf_crypto`], and
//! inflation to the recorded size.
//!
//! Archives are opened once and are immutable afterwards; extraction
//! borrows `&self` and is safe to call from concurrent readers.

pub mod archive;
pub mod entry;
pub mod error;
pub mod header;

#[cfg(feature = "testkit")]
pub mod testkit;

pub use archive::GrfArchive;
pub use entry::{EntryEncryption, EntryRecord};
pub use error::{GrfError, Result};
pub use header::{GrfHeader, HEADER_SIZE, VERSION_0X200, VERSION_0X300};
