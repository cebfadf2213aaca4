//! `grf-tool info`: archive header summary.

use serde::Serialize;
use std::path::Path;

use grf_format::GrfArchive;

use crate::CommandResult;
use crate::output::{OutputFormat, emit};

#[derive(Debug, Serialize)]
pub struct ArchiveInfo {
    pub path: String,
    pub version: u32,
    pub entries: usize,
    pub table_offset: u64,
    pub declared_file_count: u32,
}

pub fn run(archive: &Path) -> CommandResult<ArchiveInfo> {
    let archive = GrfArchive::open(archive)?;
    let header = archive.header();
    Ok(ArchiveInfo {
        path: archive.path().display().to_string(),
        version: header.version,
        entries: archive.entry_count(),
        table_offset: header.table_offset,
        declared_file_count: header.file_count,
    })
}

pub fn handle(archive: &Path, format: OutputFormat) -> CommandResult<()> {
    let info = run(archive)?;
    emit(format, &info, |info| {
        println!("Archive:  {}", info.path);
        println!("Version:  {:#06x}", info.version);
        println!("Entries:  {}", info.entries);
        println!("Table at: {:#x} (past header)", info.table_offset);
        println!("Declared: {}", info.declared_file_count);
    })
}
