//! Stored-name decoding and the mojibake transcoding helpers.
//!
//! The conversion matrix is fixed: raw archive bytes are either valid
//! UTF-8 (accepted as-is) or decoded with the configured archive
//! encoding, CP949 by default. The mojibake helpers exist for the
//! offline mapping generator and as an explicit opt-in fallback; the
//! runtime never guesses encodings beyond this.

use encoding_rs::{EUC_KR, Encoding};

use crate::error::StorageError;
use crate::paths::latin1_bytes;

/// Resolve a configured encoding label ("CP949", "EUC-KR", ...).
pub fn resolve_label(label: &str) -> Result<&'static Encoding, StorageError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| StorageError::UnknownEncoding(label.to_string()))
}

/// Decode a stored archive name: UTF-8 passes through, anything else
/// is decoded with `encoding`.
pub fn decode_stored_name(bytes: &[u8], encoding: &'static Encoding) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
    }
}

/// Reinterpret a mojibake string's code units as raw bytes and decode
/// them as CP949.
///
/// Returns `None` when the input holds characters outside Latin-1 or
/// the bytes are not valid CP949.
pub fn decode_mojibake(s: &str) -> Option<String> {
    let bytes = latin1_bytes(s)?;
    let (decoded, had_errors) = EUC_KR.decode_without_bom_handling(&bytes);
    if had_errors {
        return None;
    }
    Some(decoded.into_owned())
}

/// Inverse of [`decode_mojibake`]: encode as CP949 and reinterpret the
/// bytes as Latin-1.
pub fn encode_to_mojibake(s: &str) -> Option<String> {
    let (bytes, _, had_errors) = EUC_KR.encode(s);
    if had_errors {
        return None;
    }
    Some(bytes.iter().map(|&b| char::from(b)).collect())
}
