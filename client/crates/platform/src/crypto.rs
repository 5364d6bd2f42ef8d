//! Cryptographic Utilities

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 of a UTF-8 string and render it as lowercase hex
pub fn sha256_hex(message: &str) -> String {
    hex::encode(sha256(message.as_bytes()))
}

/// Check that a string looks like a lowercase hex SHA-256 digest
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
