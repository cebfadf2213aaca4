//! `grf-tool list`: entry listing with optional metadata and filter.

use regex::Regex;
use serde::Serialize;
use std::path::Path;

use grf_format::GrfArchive;
use grf_storage::encoding::{decode_stored_name, resolve_label};

use crate::CommandResult;
use crate::output::{OutputFormat, emit};

#[derive(Debug, Serialize)]
pub struct ListedEntry {
    /// Stored name decoded with the requested encoding.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u8>,
}

pub fn run(
    archive: &Path,
    encoding_label: &str,
    pattern: Option<&str>,
    long: bool,
) -> CommandResult<Vec<ListedEntry>> {
    let archive = GrfArchive::open(archive)?;
    let encoding = resolve_label(encoding_label)?;
    let pattern = pattern.map(Regex::new).transpose()?;

    let mut entries = Vec::new();
    for (stored_name, record) in archive.entry_records() {
        let name = decode_stored_name(stored_name, encoding);
        if let Some(pattern) = &pattern {
            if !pattern.is_match(&name) {
                continue;
            }
        }
        entries.push(if long {
            ListedEntry {
                name,
                pack_size: Some(record.pack_size),
                real_size: Some(record.real_size),
                flags: Some(record.flags),
            }
        } else {
            ListedEntry {
                name,
                pack_size: None,
                real_size: None,
                flags: None,
            }
        });
    }
    Ok(entries)
}

pub fn handle(
    archive: &Path,
    encoding_label: &str,
    pattern: Option<&str>,
    long: bool,
    format: OutputFormat,
) -> CommandResult<()> {
    let entries = run(archive, encoding_label, pattern, long)?;
    emit(format, &entries, |entries| {
        for entry in entries {
            match (entry.pack_size, entry.real_size, entry.flags) {
                (Some(pack), Some(real), Some(flags)) => {
                    println!("{:>10} {:>10}  {:#04x}  {}", pack, real, flags, entry.name);
                }
                _ => println!("{}", entry.name),
            }
        }
    })
}
