//! `grf-tool gen-mapping`: build the path-mapping document.
//!
//! Scans archives for stored names that are not valid UTF-8, decodes
//! them with the archive encoding, and emits `{ "paths": { utf8_key:
//! mojibake_value } }` — the document the server's path mapping loads.
//! Values are the raw stored bytes viewed through Latin-1, so they
//! round-trip back to byte-exact archive names.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use grf_format::GrfArchive;
use grf_storage::encoding::{decode_stored_name, resolve_label};
use grf_storage::paths::normalize;

use crate::CommandResult;

#[derive(Debug, Serialize)]
pub struct MappingDocument {
    pub paths: BTreeMap<String, String>,
}

pub fn run(archives: &[PathBuf], encoding_label: &str) -> CommandResult<MappingDocument> {
    let encoding = resolve_label(encoding_label)?;
    let mut paths = BTreeMap::new();

    for path in archives {
        let archive = match GrfArchive::open(path) {
            Ok(archive) => archive,
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "skipping unreadable archive");
                continue;
            }
        };
        for stored_name in archive.entries() {
            if std::str::from_utf8(stored_name).is_ok() {
                continue;
            }
            let key = normalize(&decode_stored_name(stored_name, encoding));
            let value: String = stored_name.iter().map(|&b| char::from(b)).collect();
            debug!(key = %key, "mapped legacy name");
            paths.insert(key, value);
        }
    }

    Ok(MappingDocument { paths })
}

pub fn handle(
    archives: &[PathBuf],
    encoding_label: &str,
    output: Option<&Path>,
) -> CommandResult<()> {
    let document = run(archives, encoding_label)?;
    let json = serde_json::to_string_pretty(&document)?;
    match output {
        Some(path) => {
            std::fs::write(path, json.as_bytes())?;
            eprintln!(
                "wrote {} mappings to {}",
                document.paths.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
