//! # Block Structure
//!
//! A block records one cash value and commits to its predecessor.
//!
//! ## Block Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Block                                       │
//! │  ├── index: u64                              │
//! │  ├── timestamp: String   (RFC 3339, UTC)     │
//! │  ├── value: i64          (the cash amount)   │
//! │  ├── hash: String        (SHA-256, hex)      │
//! │  └── prev_hash: String   ("" for genesis)    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! The block hash covers `index`, `timestamp`, `value` and `prev_hash`, in
//! that order, with both integers written as decimal text. Each field is
//! preceded by its byte length as a big-endian `u64`, so no two distinct
//! field tuples share a preimage: `(1, "2x")` and `(12, "x")` differ, and
//! a `-` cannot migrate from the timestamp into the value. `hash` itself
//! is not part of the preimage.
//!
//! Integers are encoded as decimal text. Encoding an integer as a single
//! Unicode code point instead maps surrogates and out-of-range values onto
//! the replacement character, so distinct blocks could share a preimage.
//! Chains hashed that way are not compatible with this one.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{GENESIS_INDEX, GENESIS_PREV_HASH, GENESIS_TIMESTAMP, GENESIS_VALUE};
use crate::crypto::hash::sha256_hex_multi;

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One ledger entry.
///
/// Blocks are treated as immutable after construction: nothing in this
/// crate edits a block that has been hashed. Fields stay public so peers'
/// blocks can be deserialized and inspected, and so tests can tamper.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the chain. Genesis is 0.
    pub index: u64,
    /// Creation time. Opaque to validation, but hashed.
    pub timestamp: String,
    /// Cash amount recorded by this block.
    pub value: i64,
    /// Lowercase hex SHA-256 of the other four fields.
    pub hash: String,
    /// Hash of the predecessor block. Empty for genesis.
    pub prev_hash: String,
}

impl Block {
    /// The canonical genesis block shared by every node.
    ///
    /// Uses [`GENESIS_TIMESTAMP`] so that the result is identical
    /// everywhere, forever.
    pub fn genesis() -> Self {
        Self::genesis_at(GENESIS_TIMESTAMP)
    }

    /// A genesis block with a caller-chosen timestamp.
    ///
    /// Index 0, value 0, empty `prev_hash`, and a hash computed over those
    /// fields like any other block.
    pub fn genesis_at(timestamp: impl Into<String>) -> Self {
        Self::sealed(
            GENESIS_INDEX,
            timestamp.into(),
            GENESIS_VALUE,
            GENESIS_PREV_HASH.to_string(),
        )
    }

    /// Build the successor of `predecessor` with an explicit timestamp.
    ///
    /// This is the deterministic half of [`generate_block`]. A predecessor
    /// at `u64::MAX` has no successor index; the index saturates and the
    /// result is rejected by [`crate::storage::validation::validate_link`].
    pub fn next_at(predecessor: &Block, value: i64, timestamp: impl Into<String>) -> Self {
        Self::sealed(
            predecessor.index.saturating_add(1),
            timestamp.into(),
            value,
            predecessor.hash.clone(),
        )
    }

    /// Recompute this block's hash from its fields.
    ///
    /// Compare against `self.hash` to detect tampering.
    pub fn compute_hash(&self) -> String {
        compute_block_hash(self.index, &self.timestamp, self.value, &self.prev_hash)
    }

    /// Whether this block has the genesis shape (index 0, no predecessor).
    ///
    /// Does not check the hash; see [`crate::storage::validation::validate_genesis`].
    pub fn is_genesis(&self) -> bool {
        self.index == GENESIS_INDEX && self.prev_hash == GENESIS_PREV_HASH
    }

    fn sealed(index: u64, timestamp: String, value: i64, prev_hash: String) -> Self {
        let hash = compute_block_hash(index, &timestamp, value, &prev_hash);
        Block {
            index,
            timestamp,
            value,
            hash,
            prev_hash,
        }
    }
}

// ---------------------------------------------------------------------------
// Hash Computation
// ---------------------------------------------------------------------------

/// Compute a block hash from its constituent fields.
///
/// The preimage is `len(f) || f` for each field `f` of
/// `decimal(index), timestamp, decimal(value), prev_hash`, where `len` is
/// the field's byte length as a big-endian `u64`.
pub fn compute_block_hash(index: u64, timestamp: &str, value: i64, prev_hash: &str) -> String {
    let index_text = index.to_string();
    let value_text = value.to_string();
    let fields = [
        index_text.as_bytes(),
        timestamp.as_bytes(),
        value_text.as_bytes(),
        prev_hash.as_bytes(),
    ];
    let lengths = fields.map(|f| (f.len() as u64).to_be_bytes());

    sha256_hex_multi(&[
        &lengths[0],
        fields[0],
        &lengths[1],
        fields[1],
        &lengths[2],
        fields[2],
        &lengths[3],
        fields[3],
    ])
}

/// Hash a block's four hashed fields. Pure and infallible.
pub fn calculate_hash(block: &Block) -> String {
    block.compute_hash()
}

// ---------------------------------------------------------------------------
// Block Factory
// ---------------------------------------------------------------------------

/// Build a new block extending `predecessor` and recording `value`.
///
/// The timestamp is captured now, in UTC with nanosecond precision. There
/// is no error path: any value (zero and negative included) produces a
/// block that validates against its predecessor, unless the predecessor
/// already sits at `u64::MAX` (see [`Block::next_at`]).
pub fn generate_block(predecessor: &Block, value: i64) -> Block {
    Block::next_at(predecessor, value, current_timestamp())
}

/// Current UTC time as an RFC 3339 string with nanoseconds.
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
