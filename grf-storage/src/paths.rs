//! Path normalization for index and cache keys.

/// Normalize a request path into the canonical key form: forward
/// slashes, no leading slash, lowercase.
pub fn normalize(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    slashed.trim_start_matches('/').to_lowercase()
}

/// Interpret a string as Latin-1 and return its raw bytes, or `None`
/// when some character does not fit in one byte.
///
/// Path-mapping values are legacy archive bytes round-tripped through
/// UTF-8 this way; recovering them is what makes byte-exact archive
/// searches possible.
pub fn latin1_bytes(s: &str) -> Option<Vec<u8>> {
    s.chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}
