//! Diagnostic tooling for GRF archives.
//!
//! The binary inspects archives directly, without going through the
//! server: header info, entry listings, single-entry extraction, a
//! full extraction sweep, and generation of the path-mapping document
//! the server can load for legacy-encoded names.

pub mod commands;
pub mod output;

pub use output::OutputFormat;

/// Boxed error alias used by the command handlers.
pub type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;
