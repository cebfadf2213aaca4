//! Archive round-trip and fault tests against synthetic GRF files.

use grf_format::testkit::{GrfBuilder, deflate};
use grf_format::{GrfArchive, GrfError, VERSION_0X200, VERSION_0X300};
use tempfile::TempDir;

fn write_archive(dir: &TempDir, name: &str, builder: &GrfBuilder) -> std::path::PathBuf {
    let path = dir.path().join(name);
    builder.write_to(&path).unwrap();
    path
}

#[test]
fn round_trip_plain_entries() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200)
        .entry("data\\a.txt", b"hello")
        .entry("data\\b.txt", b"world");
    let archive = GrfArchive::open(write_archive(&dir, "plain.grf", &builder)).unwrap();

    assert_eq!(archive.entry_count(), 2);
    assert_eq!(archive.entries()[0], b"data\\a.txt");
    assert_eq!(archive.read_entry(b"data\\a.txt").unwrap(), b"hello");
    assert_eq!(archive.read_entry(b"data\\b.txt").unwrap(), b"world");
}

#[test]
fn lookup_falls_back_to_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200).entry("data\\Logo.bmp", b"BM-payload");
    let archive = GrfArchive::open(write_archive(&dir, "case.grf", &builder)).unwrap();

    assert_eq!(archive.read_entry(b"data\\Logo.bmp").unwrap(), b"BM-payload");
    assert_eq!(archive.read_entry(b"DATA\\LOGO.BMP").unwrap(), b"BM-payload");
    assert_eq!(archive.read_entry(b"data\\logo.bmp").unwrap(), b"BM-payload");
}

#[test]
fn byte_exact_match_wins_over_case_fold() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200)
        .entry("x.dat", b"lower")
        .entry("X.DAT", b"upper");
    let archive = GrfArchive::open(write_archive(&dir, "dup.grf", &builder)).unwrap();

    assert_eq!(archive.read_entry(b"X.DAT").unwrap(), b"upper");
    assert_eq!(archive.read_entry(b"x.dat").unwrap(), b"lower");
}

#[test]
fn encrypted_entries_fail_at_the_inflate_stage() {
    // The cipher clears half of every processed block, so extraction
    // of ciphered fixtures mangles the stream and surfaces the §7
    // decompression fault rather than silently returning bytes.
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200)
        .entry_with_flags(b"data\\enc.spr", b"encrypted sprite", 0x02)
        .entry_with_flags(b"data\\mixed.txt", b"mixed scheme payload", 0x03)
        .entry_with_flags(b"data\\mixed_alt.txt", b"the 0x05 family", 0x05)
        .entry_with_flags(b"data\\ground.gat", b"data-crypted by extension", 0x03);
    let archive = GrfArchive::open(write_archive(&dir, "enc.grf", &builder)).unwrap();

    for name in [
        &b"data\\enc.spr"[..],
        b"data\\mixed.txt",
        b"data\\mixed_alt.txt",
        b"data\\ground.gat",
    ] {
        assert!(
            matches!(archive.read_entry(name), Err(GrfError::Decompression(_))),
            "{}",
            String::from_utf8_lossy(name)
        );
    }
}

#[test]
fn encryption_flags_force_decryption_before_inflate() {
    // Store a payload that is already a valid deflate stream but flag
    // it as encrypted: extraction must decrypt first, which mangles
    // the stream. A reader that skipped decryption would succeed here.
    let dir = TempDir::new().unwrap();
    let stored = deflate(b"perfectly good stream");
    let pack = stored.len() as u32;
    let aligned = pack.div_ceil(8) * 8;
    let mut padded = stored;
    padded.resize(aligned as usize, 0);

    let builder = GrfBuilder::new(VERSION_0X200)
        .raw_entry(b"header.bin", padded.clone(), pack, aligned, 21, 0x02)
        .raw_entry(b"mixed.bin", padded, pack, aligned, 21, 0x03);
    let archive = GrfArchive::open(write_archive(&dir, "forced.grf", &builder)).unwrap();

    assert!(matches!(
        archive.read_entry(b"header.bin"),
        Err(GrfError::Decompression(_))
    ));
    assert!(matches!(
        archive.read_entry(b"mixed.bin"),
        Err(GrfError::Decompression(_))
    ));
}

#[test]
fn mixed_fixture_round_trip_keeps_the_preserved_stream_bits() {
    // Packer-direction construction followed by the decryption pass:
    // every ciphered block keeps exactly the bits the round preserves.
    let stream = deflate(b"some compressible payload for the round trip");
    let mut buf = stream.clone();
    buf.resize(buf.len().div_ceil(8) * 8, 0);
    let reference = buf.clone();

    grf_crypto::encrypt_mixed(&mut buf, 2, false);
    grf_crypto::decrypt_mixed(&mut buf, 2, false);
    for (got, orig) in buf.iter().zip(&reference) {
        assert_eq!(*got, orig & 0x55);
    }
}

#[test]
fn empty_archive_lists_nothing() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200);
    let archive = GrfArchive::open(write_archive(&dir, "empty.grf", &builder)).unwrap();

    assert!(archive.entries().is_empty());
    assert!(matches!(
        archive.read_entry(b"anything"),
        Err(GrfError::EntryNotFound(_))
    ));
}

#[test]
fn version_0x300_round_trip() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X300)
        .entry("data\\wide.txt", b"wide offsets")
        .entry("data\\wide2.txt", b"21-byte metadata block");
    let archive = GrfArchive::open(write_archive(&dir, "wide.grf", &builder)).unwrap();

    assert_eq!(archive.header().version, VERSION_0X300);
    assert_eq!(archive.read_entry(b"data\\wide.txt").unwrap(), b"wide offsets");
    assert_eq!(
        archive.read_entry(b"data\\wide2.txt").unwrap(),
        b"21-byte metadata block"
    );
}

#[test]
fn alternate_signature_is_accepted() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200)
        .signature(b"Event Horizon")
        .entry("a.txt", b"alt");
    let archive = GrfArchive::open(write_archive(&dir, "alt.grf", &builder)).unwrap();
    assert_eq!(archive.read_entry(b"a.txt").unwrap(), b"alt");
}

#[test]
fn unknown_signature_is_rejected() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200).signature(b"Apprentice of Magic");
    let err = GrfArchive::open(write_archive(&dir, "bad_sig.grf", &builder)).unwrap_err();
    assert!(matches!(err, GrfError::InvalidSignature));
}

#[test]
fn unsupported_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(0x103).entry("a.txt", b"old");
    let err = GrfArchive::open(write_archive(&dir, "old.grf", &builder)).unwrap_err();
    assert!(matches!(err, GrfError::UnsupportedVersion(0x103)));
}

#[test]
fn short_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.grf");
    std::fs::write(&path, b"Master of").unwrap();
    assert!(matches!(
        GrfArchive::open(&path),
        Err(GrfError::Truncated { .. })
    ));
}

#[test]
fn corrupt_table_fails_decompression() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200).entry("a.txt", b"payload");
    let mut bytes = builder.build();
    // the compressed table sits at the end of the file
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    let path = dir.path().join("corrupt.grf");
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        GrfArchive::open(&path),
        Err(GrfError::TableDecompression(_))
    ));
}

#[test]
fn reserved_flag_0x04_fails() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200).entry_with_flags(b"odd.bin", b"data", 0x04);
    let archive = GrfArchive::open(write_archive(&dir, "flag4.grf", &builder)).unwrap();

    assert!(matches!(
        archive.read_entry(b"odd.bin"),
        Err(GrfError::UnknownEntryFlag(0x04))
    ));
}

#[test]
fn real_size_mismatch_is_detected() {
    let dir = TempDir::new().unwrap();
    let stored = deflate(b"hello");
    let pack = stored.len() as u32;
    let aligned = pack.div_ceil(8) * 8;
    let mut padded = stored;
    padded.resize(aligned as usize, 0);

    let builder =
        GrfBuilder::new(VERSION_0X200).raw_entry(b"lied.txt", padded, pack, aligned, 999, 0x01);
    let archive = GrfArchive::open(write_archive(&dir, "lied.grf", &builder)).unwrap();

    assert!(matches!(
        archive.read_entry(b"lied.txt"),
        Err(GrfError::SizeMismatch {
            expected: 999,
            actual: 5
        })
    ));
}

#[test]
fn garbage_payload_fails_inflate() {
    let dir = TempDir::new().unwrap();
    let builder = GrfBuilder::new(VERSION_0X200).raw_entry(
        b"noise.bin",
        vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x00, 0x00, 0x00],
        8,
        8,
        32,
        0x01,
    );
    let archive = GrfArchive::open(write_archive(&dir, "noise.grf", &builder)).unwrap();

    assert!(matches!(
        archive.read_entry(b"noise.bin"),
        Err(GrfError::Decompression(_))
    ));
}

#[test]
fn misaligned_record_is_rejected() {
    let dir = TempDir::new().unwrap();
    let builder =
        GrfBuilder::new(VERSION_0X200).raw_entry(b"skew.bin", vec![0u8; 12], 10, 12, 4, 0x02);
    let archive = GrfArchive::open(write_archive(&dir, "skew.grf", &builder)).unwrap();

    assert!(matches!(
        archive.read_entry(b"skew.bin"),
        Err(GrfError::InvalidEntry { .. })
    ));
}

#[test]
fn payload_outside_the_archive_is_rejected() {
    let dir = TempDir::new().unwrap();
    // record claims more aligned bytes than are stored in the file
    let builder =
        GrfBuilder::new(VERSION_0X200).raw_entry(b"over.bin", vec![0u8; 8], 8, 1024, 4, 0x02);
    let archive = GrfArchive::open(write_archive(&dir, "over.grf", &builder)).unwrap();

    assert!(matches!(
        archive.read_entry(b"over.bin"),
        Err(GrfError::InvalidEntry { .. })
    ));
}
