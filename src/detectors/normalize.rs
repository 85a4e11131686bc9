//! detectors/normalize.rs
//!
//! Whitespace normalization and content digests.

use sha2::{Digest, Sha256};

/// Trim every line, drop blank ones, rejoin with `\n`.
///
/// Indentation style and trailing blank lines never register as
/// divergence after this.
pub fn normalize(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hex SHA-256 of already-normalized text.
pub fn digest(normalized: &str) -> String {
    let mut h = Sha256::new();
    h.update(normalized.as_bytes());
    hex::encode(h.finalize())
}

pub fn content_digest(text: &str) -> String {
    digest(&normalize(text))
}
