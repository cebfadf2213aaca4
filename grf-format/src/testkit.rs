//! Synthetic archive construction for test suites.
//!
//! The builder produces byte-exact archives for both supported
//! versions. Encrypted entries are stored through the packer-direction
//! transforms behind `grf_crypto`'s `testkit` feature. The decryption
//! direction clears the permuted right half of every ciphered block,
//! so extraction of such entries recovers only the preserved bits of
//! the stream and fails the inflate stage; suites assert that
//! degradation rather than a content round trip.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;
use std::path::Path;

use crate::entry::cipher_params;
use crate::header::VERSION_0X300;

pub struct GrfBuilder {
    version: u32,
    signature: [u8; 16],
    entries: Vec<BuiltEntry>,
}

struct BuiltEntry {
    name: Vec<u8>,
    stored: Vec<u8>,
    pack_size: u32,
    length_aligned: u32,
    real_size: u32,
    flags: u8,
}

impl GrfBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            signature: *b"Master of Magic\0",
            entries: Vec::new(),
        }
    }

    /// Override the signature; NUL-padded or truncated to 16 bytes.
    pub fn signature(mut self, signature: &[u8]) -> Self {
        let mut padded = [0u8; 16];
        let len = signature.len().min(16);
        padded[..len].copy_from_slice(&signature[..len]);
        self.signature = padded;
        self
    }

    /// Add a plain (flag 0x01) entry.
    pub fn entry(self, name: &str, content: &[u8]) -> Self {
        self.entry_with_flags(name.as_bytes(), content, 0x01)
    }

    /// Add an entry with raw name bytes and an explicit flag byte.
    pub fn entry_with_flags(mut self, name: &[u8], content: &[u8], flags: u8) -> Self {
        let deflated = deflate(content);
        let pack_size = deflated.len() as u32;
        let length_aligned = pack_size.div_ceil(8) * 8;

        let mut stored = deflated;
        stored.resize(length_aligned as usize, 0);
        match flags {
            0x02 => grf_crypto::encrypt_header(&mut stored),
            0x03 | 0x05 => {
                let (cycle, data_crypted) = cipher_params(name, pack_size);
                grf_crypto::encrypt_mixed(&mut stored, cycle, data_crypted);
            }
            _ => {}
        }

        self.entries.push(BuiltEntry {
            name: name.to_vec(),
            stored,
            pack_size,
            length_aligned,
            real_size: content.len() as u32,
            flags,
        });
        self
    }

    /// Add an entry with full control over the stored bytes and record
    /// fields, for fault injection.
    pub fn raw_entry(
        mut self,
        name: &[u8],
        stored: Vec<u8>,
        pack_size: u32,
        length_aligned: u32,
        real_size: u32,
        flags: u8,
    ) -> Self {
        self.entries.push(BuiltEntry {
            name: name.to_vec(),
            stored,
            pack_size,
            length_aligned,
            real_size,
            flags,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let wide = self.version == VERSION_0X300;

        let mut payload = Vec::new();
        let mut table = Vec::new();
        for entry in &self.entries {
            let position = payload.len() as u64;
            payload.extend_from_slice(&entry.stored);

            table.extend_from_slice(&entry.name);
            table.push(0);
            table.extend_from_slice(&entry.pack_size.to_le_bytes());
            table.extend_from_slice(&entry.length_aligned.to_le_bytes());
            table.extend_from_slice(&entry.real_size.to_le_bytes());
            table.push(entry.flags);
            if wide {
                table.extend_from_slice(&position.to_le_bytes());
            } else {
                table.extend_from_slice(&(position as u32).to_le_bytes());
            }
        }

        let table_offset = payload.len() as u64;
        let compressed_table = if table.is_empty() {
            Vec::new()
        } else {
            deflate(&table)
        };

        let mut out = Vec::with_capacity(46 + payload.len() + compressed_table.len() + 16);
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&[0u8; 14]);
        if wide {
            out.extend_from_slice(&table_offset.to_le_bytes());
        } else {
            out.extend_from_slice(&(table_offset as u32).to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
        }
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());

        out.extend_from_slice(&payload);

        if wide {
            // undocumented field preceding the size prefix
            out.extend_from_slice(&0u32.to_le_bytes());
        }
        out.extend_from_slice(&(compressed_table.len() as u32).to_le_bytes());
        out.extend_from_slice(&(table.len() as u32).to_le_bytes());
        out.extend_from_slice(&compressed_table);
        out
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }
}

/// Zlib-wrap `data` at the default compression level.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("writing to a Vec");
    encoder.finish().expect("finishing a Vec-backed encoder")
}
