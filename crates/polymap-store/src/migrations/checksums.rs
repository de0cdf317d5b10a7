//! Checksum of migration SQL

use sha2::{Digest, Sha256};

/// SHA256 of a string, hex-encoded
pub fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
