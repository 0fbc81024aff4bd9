use std::path::Path;

/// Compute the BLAKE3 hash of a byte slice, returning the hex-encoded digest.
#[must_use]
pub fn blake3_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Short, stable identifier for a filesystem path.
///
/// Hashes the path's string form and keeps the first `len` hex characters
/// (clamped to the digest length). Used to derive per-project staging
/// directory names that do not collide across projects.
#[must_use]
pub fn path_digest(path: &Path, len: usize) -> String {
    let mut digest = blake3_bytes(path.to_string_lossy().as_bytes());
    digest.truncate(len.min(digest.len()));
    digest
}
