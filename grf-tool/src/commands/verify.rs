//! `grf-tool verify`: attempt extraction of every entry.

use serde::Serialize;
use std::path::Path;
use tracing::warn;

use grf_format::GrfArchive;

use crate::CommandResult;
use crate::output::{OutputFormat, emit};

#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub entries: usize,
    pub failed: Vec<FailedEntry>,
}

#[derive(Debug, Serialize)]
pub struct FailedEntry {
    pub name: String,
    pub error: String,
}

pub fn run(archive: &Path) -> CommandResult<VerifyReport> {
    let archive = GrfArchive::open(archive)?;
    let mut failed = Vec::new();
    let mut entries = 0usize;

    for stored_name in archive.entries() {
        entries += 1;
        if let Err(e) = archive.read_entry(stored_name) {
            let name = String::from_utf8_lossy(stored_name).into_owned();
            warn!(name = %name, error = %e, "entry failed verification");
            failed.push(FailedEntry {
                name,
                error: e.to_string(),
            });
        }
    }

    Ok(VerifyReport { entries, failed })
}

pub fn handle(archive: &Path, format: OutputFormat) -> CommandResult<()> {
    let report = run(archive)?;
    emit(format, &report, |report| {
        if report.failed.is_empty() {
            println!("{} entries, all extract cleanly", report.entries);
        } else {
            println!(
                "{} entries, {} failed:",
                report.entries,
                report.failed.len()
            );
            for failure in &report.failed {
                println!("  {}: {}", failure.name, failure.error);
            }
        }
    })?;
    if !report.failed.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
