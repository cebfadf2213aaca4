//! Per-entry metadata records from the directory table.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{GrfError, Result};
use crate::header::GrfHeader;

/// Extensions whose mixed-encrypted payloads use the data-crypted
/// scheme (cycle 0, no shuffle machinery).
const DATA_CRYPTED_EXTENSIONS: [&[u8]; 4] = [b".gnd", b".gat", b".act", b".str"];

/// How an entry's payload is protected on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryEncryption {
    /// Stored as a plain deflate stream.
    Plain,
    /// First blocks of the payload are DES-ciphered.
    Header,
    /// Cycle-driven block selection over the whole payload.
    Mixed,
}

/// One entry's fixed-size metadata, as stored after its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRecord {
    /// Size of the stored (possibly encrypted) compressed payload.
    pub pack_size: u32,
    /// Stored size rounded up for cipher block alignment.
    pub length_aligned: u32,
    /// Size after inflation.
    pub real_size: u32,
    /// Raw flag byte.
    pub flags: u8,
    /// Payload offset, relative to the end of the archive header.
    pub position: u64,
}

impl EntryRecord {
    /// Parse a record off the directory table, 17 bytes for version
    /// 0x200 and 21 for 0x300 (64-bit position).
    pub fn parse(raw: &[u8], header: &GrfHeader) -> Result<Self> {
        let mut cursor = Cursor::new(raw);
        let pack_size = cursor.read_u32::<LittleEndian>()?;
        let length_aligned = cursor.read_u32::<LittleEndian>()?;
        let real_size = cursor.read_u32::<LittleEndian>()?;
        let flags = cursor.read_u8()?;
        let position = if header.wide_offsets() {
            cursor.read_u64::<LittleEndian>()?
        } else {
            u64::from(cursor.read_u32::<LittleEndian>()?)
        };

        Ok(Self {
            pack_size,
            length_aligned,
            real_size,
            flags,
            position,
        })
    }

    /// Interpret the flag byte. 0x04 is reserved and anything past
    /// 0x05 is unknown; both are rejected.
    pub fn encryption(&self) -> Result<EntryEncryption> {
        match self.flags {
            0x01 => Ok(EntryEncryption::Plain),
            0x02 => Ok(EntryEncryption::Header),
            0x03 | 0x05 => Ok(EntryEncryption::Mixed),
            other => Err(GrfError::UnknownEntryFlag(other)),
        }
    }

    /// Bytes to fetch from the payload region: encrypted entries are
    /// read at block alignment, plain ones at their stored size.
    pub fn read_size(&self) -> Result<u32> {
        Ok(match self.encryption()? {
            EntryEncryption::Plain => self.pack_size,
            _ => self.length_aligned,
        })
    }

    /// Check the structural invariants against the payload region size
    /// (archive file size minus the header).
    pub fn validate(&self, name: &[u8], payload_region: u64) -> Result<()> {
        let fail = |reason: String| {
            Err(GrfError::InvalidEntry {
                name: String::from_utf8_lossy(name).into_owned(),
                reason,
            })
        };

        if self.pack_size > self.length_aligned {
            return fail(format!(
                "pack_size {} exceeds aligned length {}",
                self.pack_size, self.length_aligned
            ));
        }
        if self.length_aligned % 8 != 0 {
            return fail(format!(
                "aligned length {} is not block aligned",
                self.length_aligned
            ));
        }
        let span = u64::from(self.pack_size.max(self.length_aligned));
        if self.position.checked_add(span).is_none_or(|end| end > payload_region) {
            return fail(format!(
                "payload region {}+{span} lies outside the archive",
                self.position
            ));
        }
        Ok(())
    }
}

/// Cipher parameters for a mixed-encrypted entry: the decryption cycle
/// and whether the data-crypted scheme applies.
///
/// Data-crypted extensions force cycle 0; everything else derives the
/// cycle from the stored size's base-10 digit count.
pub fn cipher_params(stored_name: &[u8], pack_size: u32) -> (u32, bool) {
    if is_data_crypted(stored_name) {
        return (0, true);
    }
    (digit_count(pack_size), false)
}

fn is_data_crypted(stored_name: &[u8]) -> bool {
    DATA_CRYPTED_EXTENSIONS.iter().any(|ext| {
        stored_name.len() >= ext.len()
            && stored_name[stored_name.len() - ext.len()..].eq_ignore_ascii_case(ext)
    })
}

fn digit_count(mut n: u32) -> u32 {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{GrfHeader, VERSION_0X200, VERSION_0X300};

    fn header(version: u32) -> GrfHeader {
        GrfHeader {
            key: [0; 14],
            table_offset: 0,
            seed: 0,
            file_count: 0,
            version,
        }
    }

    #[test]
    fn parses_narrow_and_wide_records() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&100u32.to_le_bytes());
        raw.extend_from_slice(&104u32.to_le_bytes());
        raw.extend_from_slice(&400u32.to_le_bytes());
        raw.push(0x01);
        raw.extend_from_slice(&0x2000u32.to_le_bytes());

        let record = EntryRecord::parse(&raw, &header(VERSION_0X200)).unwrap();
        assert_eq!(record.pack_size, 100);
        assert_eq!(record.length_aligned, 104);
        assert_eq!(record.real_size, 400);
        assert_eq!(record.position, 0x2000);

        let mut wide = raw[..13].to_vec();
        wide.extend_from_slice(&0x1_0000_2000u64.to_le_bytes());
        let record = EntryRecord::parse(&wide, &header(VERSION_0X300)).unwrap();
        assert_eq!(record.position, 0x1_0000_2000);
    }

    #[test]
    fn flag_mapping_is_the_newest_revision() {
        let mut record = EntryRecord {
            pack_size: 8,
            length_aligned: 8,
            real_size: 10,
            flags: 0x01,
            position: 0,
        };
        assert_eq!(record.encryption().unwrap(), EntryEncryption::Plain);
        record.flags = 0x02;
        assert_eq!(record.encryption().unwrap(), EntryEncryption::Header);
        record.flags = 0x03;
        assert_eq!(record.encryption().unwrap(), EntryEncryption::Mixed);
        record.flags = 0x05;
        assert_eq!(record.encryption().unwrap(), EntryEncryption::Mixed);
        record.flags = 0x04;
        assert!(matches!(
            record.encryption(),
            Err(GrfError::UnknownEntryFlag(0x04))
        ));
        record.flags = 0x06;
        assert!(record.encryption().is_err());
    }

    #[test]
    fn validation_enforces_the_record_invariants() {
        let good = EntryRecord {
            pack_size: 30,
            length_aligned: 32,
            real_size: 100,
            flags: 0x02,
            position: 64,
        };
        assert!(good.validate(b"a.txt", 96).is_ok());

        let mut bad = good;
        bad.pack_size = 40;
        assert!(bad.validate(b"a.txt", 96).is_err());

        bad = good;
        bad.length_aligned = 30;
        assert!(bad.validate(b"a.txt", 96).is_err());

        bad = good;
        bad.position = 80;
        assert!(bad.validate(b"a.txt", 96).is_err());
    }

    #[test]
    fn data_crypted_extensions_force_cycle_zero() {
        assert_eq!(cipher_params(b"data/map.gat", 12345), (0, true));
        assert_eq!(cipher_params(b"DATA/MAP.GND", 1), (0, true));
        assert_eq!(cipher_params(b"sprite.ACT", 99), (0, true));
        assert_eq!(cipher_params(b"effect.str", 7), (0, true));
    }

    #[test]
    fn cycle_is_the_digit_count_of_the_stored_size() {
        assert_eq!(cipher_params(b"a.txt", 0), (1, false));
        assert_eq!(cipher_params(b"a.txt", 9), (1, false));
        assert_eq!(cipher_params(b"a.txt", 10), (2, false));
        assert_eq!(cipher_params(b"a.txt", 12345), (5, false));
        assert_eq!(cipher_params(b"a.spr", 1_000_000), (7, false));
    }
}
