//! Command implementations.
//!
//! Each module exposes a `run` function returning structured data and
//! a `handle` wrapper that renders it; tests call `run` directly.

pub mod extract;
pub mod info;
pub mod list;
pub mod mapping;
pub mod verify;
