//! # Cryptographic Primitives
//!
//! The ledger needs exactly one primitive: a collision-resistant 256-bit
//! hash. We use SHA-256 from the `sha2` crate and render digests as
//! lowercase hex, which is what ends up inside every block.

pub mod hash;

pub use hash::{sha256, sha256_array, sha256_hex, sha256_hex_multi};
