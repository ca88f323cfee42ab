use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a raw token value.
///
/// Single-use tokens and their database rows only ever meet through this
/// digest; the raw secret is never stored.
pub fn sha256_hex(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
