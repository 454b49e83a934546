//! # Hashing Utilities
//!
//! SHA-256 wrappers. Block hashes are stored and compared as lowercase hex
//! strings, so most callers want [`sha256_hex`] or [`sha256_hex_multi`].
//! The raw-byte variants exist for tests and for anything that wants to
//! compare digests without going through text.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use cashchain_protocol::crypto::sha256;
///
/// let hash = sha256(b"cashchain");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the SHA-256 hash and render it as 64 lowercase hex characters.
///
/// ```
/// use cashchain_protocol::crypto::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256_array(data))
}

/// Hash several byte slices as if they were concatenated, then hex-encode.
///
/// Feeds each part into the hasher in order, so there is no temporary
/// buffer. `sha256_hex_multi(&[a, b]) == sha256_hex(a ++ b)`.
pub fn sha256_hex_multi(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let digest: [u8; 32] = hasher.finalize().into();
    hex::encode(digest)
}
