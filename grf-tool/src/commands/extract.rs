//! `grf-tool extract`: pull one entry out of an archive.

use std::io::Write;
use std::path::Path;

use grf_format::GrfArchive;
use grf_storage::encoding::resolve_label;
use grf_storage::paths::latin1_bytes;

use crate::CommandResult;

/// Extract `name` and return its content.
///
/// The name is tried as its raw UTF-8 bytes, then re-encoded with the
/// archive encoding, then as Latin-1 bytes (the mojibake form used by
/// path-mapping values), so any spelling a mapping document carries
/// will resolve.
pub fn run(archive: &Path, name: &str, encoding_label: &str) -> CommandResult<Vec<u8>> {
    let archive = GrfArchive::open(archive)?;
    let encoding = resolve_label(encoding_label)?;

    match archive.read_entry(name.as_bytes()) {
        Ok(data) => return Ok(data),
        Err(grf_format::GrfError::EntryNotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let (encoded, _, had_errors) = encoding.encode(name);
    if !had_errors {
        match archive.read_entry(&encoded) {
            Ok(data) => return Ok(data),
            Err(grf_format::GrfError::EntryNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(bytes) = latin1_bytes(name) {
        return Ok(archive.read_entry(&bytes)?);
    }
    Err(grf_format::GrfError::EntryNotFound(name.to_string()).into())
}

pub fn handle(
    archive: &Path,
    name: &str,
    encoding_label: &str,
    output: Option<&Path>,
) -> CommandResult<()> {
    let data = run(archive, name, encoding_label)?;
    match output {
        Some(path) => {
            std::fs::write(path, &data)?;
            eprintln!("wrote {} bytes to {}", data.len(), path.display());
        }
        None => std::io::stdout().write_all(&data)?,
    }
    Ok(())
}
