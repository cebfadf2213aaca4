//! The 46-byte GRF archive header.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{GrfError, Result};

/// Total header size; payload positions are relative to its end.
pub const HEADER_SIZE: usize = 46;

/// Archive version with 32-bit table offsets and entry positions.
pub const VERSION_0X200: u32 = 0x200;

/// Archive version with 64-bit table offsets and entry positions.
pub const VERSION_0X300: u32 = 0x300;

/// Accepted signatures, NUL-padded to 16 bytes.
const SIGNATURES: [&[u8; 16]; 2] = [b"Master of Magic\0", b"Event Horizon\0\0\0"];

/// Parsed archive header.
///
/// Layout: 16 signature bytes, 14 key bytes, then little-endian 32-bit
/// `table_offset`, `seed`, `file_count`, `version`. Version 0x300
/// widens `table_offset` to 64 bits by taking the `seed` slot as its
/// high half.
#[derive(Debug, Clone)]
pub struct GrfHeader {
    pub key: [u8; 14],
    /// Directory table offset, relative to the end of the header.
    pub table_offset: u64,
    pub seed: u32,
    pub file_count: u32,
    pub version: u32,
}

impl GrfHeader {
    /// Parse and validate a raw header.
    pub fn parse(raw: &[u8; HEADER_SIZE]) -> Result<Self> {
        if !SIGNATURES.iter().any(|sig| raw[..16] == sig[..]) {
            return Err(GrfError::InvalidSignature);
        }

        let mut key = [0u8; 14];
        key.copy_from_slice(&raw[16..30]);

        let version = LittleEndian::read_u32(&raw[42..46]);
        let (table_offset, seed) = match version {
            VERSION_0X200 => (
                u64::from(LittleEndian::read_u32(&raw[30..34])),
                LittleEndian::read_u32(&raw[34..38]),
            ),
            VERSION_0X300 => (LittleEndian::read_u64(&raw[30..38]), 0),
            other => return Err(GrfError::UnsupportedVersion(other)),
        };

        Ok(Self {
            key,
            table_offset,
            seed,
            file_count: LittleEndian::read_u32(&raw[38..42]),
            version,
        })
    }

    /// Size in bytes of one entry's metadata block, excluding its name.
    pub const fn entry_metadata_len(&self) -> usize {
        match self.version {
            VERSION_0X300 => 21,
            _ => 17,
        }
    }

    /// Whether entry positions and the table offset are 64-bit.
    pub const fn wide_offsets(&self) -> bool {
        self.version == VERSION_0X300
    }
}

/// Narrow a file offset to the platform address range.
///
/// 0x300 archives can carry offsets beyond what a 32-bit target can
/// address; those must fail loudly instead of wrapping.
pub fn narrow_offset(offset: u64) -> Result<usize> {
    usize::try_from(offset).map_err(|_| GrfError::OffsetOverflow(offset))
}
