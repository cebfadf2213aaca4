//! Archive handle: header validation, directory table, entry extraction.

use byteorder::{ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;
use memmap2::Mmap;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use crate::entry::{EntryEncryption, EntryRecord, cipher_params};
use crate::error::{GrfError, Result};
use crate::header::{GrfHeader, HEADER_SIZE, narrow_offset};

/// An opened, immutable GRF archive.
///
/// The directory table is inflated into memory on open; payload reads
/// are positional against a memory map (or a lock-serialized file
/// handle when mapping fails), so extraction works from `&self` under
/// concurrent readers.
#[derive(Debug)]
pub struct GrfArchive {
    path: PathBuf,
    header: GrfHeader,
    payload: PayloadSource,
    file_size: u64,
    table: Vec<u8>,
    names: OnceLock<Vec<Vec<u8>>>,
}

#[derive(Debug)]
enum PayloadSource {
    Mapped(Mmap),
    Seekable(Mutex<File>),
}

impl GrfArchive {
    /// Open an archive, validate its header, and load the directory
    /// table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE as u64 {
            return Err(GrfError::Truncated {
                offset: 0,
                wanted: HEADER_SIZE,
            });
        }

        let mut raw = [0u8; HEADER_SIZE];
        file.read_exact(&mut raw)?;
        let header = GrfHeader::parse(&raw)?;

        let table = load_table(&mut file, &header, file_size)?;

        // Map the whole file for positional payload reads; fall back to
        // the shared handle under a lock when mapping is unavailable.
        let payload = match unsafe { Mmap::map(&file) } {
            Ok(map) => PayloadSource::Mapped(map),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "mmap failed, using seek reads");
                PayloadSource::Seekable(Mutex::new(file))
            }
        };

        debug!(
            path = %path.display(),
            version = header.version,
            table_bytes = table.len(),
            "opened archive"
        );

        Ok(Self {
            path,
            header,
            payload,
            file_size,
            table,
            names: OnceLock::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &GrfHeader {
        &self.header
    }

    /// Stored names in directory-table order, as raw bytes in the
    /// archive's native encoding. Built once and cached.
    pub fn entries(&self) -> &[Vec<u8>] {
        self.names.get_or_init(|| {
            self.records()
                .map(|(name, _)| name.to_vec())
                .collect()
        })
    }

    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }

    /// Stored names paired with their parsed metadata records, in
    /// directory-table order. Records too short to parse are skipped.
    pub fn entry_records(&self) -> impl Iterator<Item = (&[u8], EntryRecord)> + '_ {
        self.records().filter_map(|(name, raw)| {
            EntryRecord::parse(raw, &self.header)
                .ok()
                .map(|record| (name, record))
        })
    }

    /// Extract one entry by its stored name.
    ///
    /// The name is matched byte-exact first, then case-insensitively.
    /// The payload is read at its recorded position, decrypted per its
    /// flag, truncated to the stored size, and inflated; the result is
    /// exactly `real_size` bytes or an error.
    pub fn read_entry(&self, stored_name: &[u8]) -> Result<Vec<u8>> {
        let (name, raw_record) = self
            .find_record(stored_name)
            .ok_or_else(|| GrfError::EntryNotFound(lossy_name(stored_name)))?;
        let record = EntryRecord::parse(raw_record, &self.header)?;

        let encryption = record.encryption()?;
        record.validate(name, self.file_size - HEADER_SIZE as u64)?;

        let read_size = narrow_offset(u64::from(record.read_size()?))?;
        let offset = HEADER_SIZE as u64 + record.position;
        let mut data = self.read_at(offset, read_size)?;

        match encryption {
            EntryEncryption::Plain => {}
            EntryEncryption::Header => grf_crypto::decrypt_header(&mut data),
            EntryEncryption::Mixed => {
                let (cycle, data_crypted) = cipher_params(name, record.pack_size);
                grf_crypto::decrypt_mixed(&mut data, cycle, data_crypted);
            }
        }
        data.truncate(record.pack_size as usize);

        let out = inflate(&data, record.real_size as usize).map_err(GrfError::Decompression)?;
        if out.len() != record.real_size as usize {
            return Err(GrfError::SizeMismatch {
                expected: record.real_size,
                actual: out.len(),
            });
        }
        Ok(out)
    }

    /// Walk the directory table, yielding each stored name and the raw
    /// metadata block that follows it.
    fn records(&self) -> RecordWalker<'_> {
        RecordWalker {
            table: &self.table,
            meta_len: self.header.entry_metadata_len(),
            pos: 0,
        }
    }

    fn find_record(&self, wanted: &[u8]) -> Option<(&[u8], &[u8])> {
        self.records()
            .find(|(name, _)| *name == wanted)
            .or_else(|| {
                self.records()
                    .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            })
    }

    /// Positional read, bounds-checked against the archive size.
    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if offset
            .checked_add(len as u64)
            .is_none_or(|end| end > self.file_size)
        {
            return Err(GrfError::Truncated {
                offset,
                wanted: len,
            });
        }

        match &self.payload {
            PayloadSource::Mapped(map) => {
                let start = narrow_offset(offset)?;
                Ok(map[start..start + len].to_vec())
            }
            PayloadSource::Seekable(file) => {
                let mut file = file.lock();
                file.seek(SeekFrom::Start(offset))?;
                let mut buf = vec![0u8; len];
                file.read_exact(&mut buf).map_err(|e| {
                    if e.kind() == ErrorKind::UnexpectedEof {
                        GrfError::Truncated {
                            offset,
                            wanted: len,
                        }
                    } else {
                        GrfError::Io(e)
                    }
                })?;
                Ok(buf)
            }
        }
    }
}

struct RecordWalker<'a> {
    table: &'a [u8],
    meta_len: usize,
    pos: usize,
}

impl<'a> Iterator for RecordWalker<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.table.get(self.pos..)?;
        let nul = rest.iter().position(|&b| b == 0)?;
        let meta_start = nul + 1;
        let meta_end = meta_start + self.meta_len;
        if meta_end > rest.len() {
            // truncated trailing record
            return None;
        }
        self.pos += meta_end;
        Some((&rest[..nul], &rest[meta_start..meta_end]))
    }
}

/// Seek to the directory table, read its 8-byte size prefix, and
/// inflate it. Version 0x300 carries an extra, undocumented 32-bit
/// field before the prefix that is read and discarded.
fn load_table(file: &mut File, header: &GrfHeader, file_size: u64) -> Result<Vec<u8>> {
    let table_pos = (HEADER_SIZE as u64)
        .checked_add(header.table_offset)
        .filter(|pos| *pos < file_size)
        .ok_or(GrfError::Truncated {
            offset: header.table_offset,
            wanted: 8,
        })?;

    file.seek(SeekFrom::Start(table_pos))?;

    if header.wide_offsets() {
        let mut unknown = [0u8; 4];
        file.read_exact(&mut unknown)?;
    }

    let mut prefix = [0u8; 8];
    file.read_exact(&mut prefix)?;
    let compressed_size = LittleEndian::read_u32(&prefix[..4]);
    let uncompressed_size = LittleEndian::read_u32(&prefix[4..]);

    if compressed_size == 0 && uncompressed_size == 0 {
        return Ok(Vec::new());
    }

    let mut compressed = vec![0u8; narrow_offset(u64::from(compressed_size))?];
    file.read_exact(&mut compressed).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            GrfError::Truncated {
                offset: table_pos,
                wanted: compressed.len(),
            }
        } else {
            GrfError::Io(e)
        }
    })?;

    let table = inflate(&compressed, uncompressed_size as usize)
        .map_err(GrfError::TableDecompression)?;
    if table.len() != uncompressed_size as usize {
        return Err(GrfError::TableSizeMismatch {
            expected: uncompressed_size,
            actual: table.len(),
        });
    }
    Ok(table)
}

fn inflate(data: &[u8], size_hint: usize) -> std::result::Result<Vec<u8>, String> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(size_hint);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| e.to_string())?;
    Ok(out)
}

fn lossy_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}
