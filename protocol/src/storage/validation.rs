//! # Block Validation
//!
//! Checks a candidate block against the block it claims to extend. Three
//! checks, in order, stopping at the first failure:
//!
//! 1. **Index continuity**: `predecessor.index + 1 == candidate.index`.
//!    Catches missing, duplicated, and reordered blocks. A predecessor at
//!    `u64::MAX` has no valid successor.
//! 2. **Hash link**: `predecessor.hash == candidate.prev_hash`.
//!    Catches forged or stale links.
//! 3. **Digest**: the stored hash equals a fresh recomputation.
//!    Catches edits to any hashed field after the hash was taken.
//!
//! An invalid block is an ordinary outcome, not a failure of the validator.
//! [`is_valid`] answers yes/no; [`validate_link`] says which check failed.

use thiserror::Error;

use super::block::Block;
use crate::config::{GENESIS_INDEX, GENESIS_PREV_HASH};

/// Why a candidate block does not extend its claimed predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The candidate's index is not the predecessor's index plus one.
    #[error("invalid index: expected {expected}, got {got}")]
    IndexMismatch {
        /// `predecessor.index + 1`.
        expected: u64,
        /// The candidate's index.
        got: u64,
    },

    /// The predecessor sits at `u64::MAX`; nothing can follow it.
    #[error("block at index {0} has no successor")]
    IndexExhausted(u64),

    /// The candidate does not point at the predecessor's hash.
    #[error("invalid previous hash at index {index}: expected {expected}, got {got}")]
    PrevHashMismatch {
        /// The candidate's index.
        index: u64,
        /// The predecessor's hash.
        expected: String,
        /// The candidate's `prev_hash`.
        got: String,
    },

    /// The candidate's stored hash does not match its contents.
    #[error("invalid hash at index {index}: stored {stored}, computed {computed}")]
    HashMismatch {
        /// The candidate's index.
        index: u64,
        /// Hash carried by the block.
        stored: String,
        /// Hash recomputed from the block's fields.
        computed: String,
    },
}

/// Why a block cannot serve as the first block of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenesisError {
    /// Genesis must sit at index 0.
    #[error("genesis block must have index 0, got {0}")]
    NonZeroIndex(u64),

    /// Genesis has no predecessor, so its `prev_hash` must be empty.
    #[error("genesis block must have an empty previous hash, got {0}")]
    HasPredecessor(String),

    /// The genesis hash does not match its contents.
    #[error("genesis hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch {
        /// Hash carried by the block.
        stored: String,
        /// Hash recomputed from the block's fields.
        computed: String,
    },
}

/// Check `candidate` against `predecessor`, reporting the first failed check.
pub fn validate_link(candidate: &Block, predecessor: &Block) -> Result<(), LinkError> {
    let expected = predecessor
        .index
        .checked_add(1)
        .ok_or(LinkError::IndexExhausted(predecessor.index))?;
    if candidate.index != expected {
        return Err(LinkError::IndexMismatch {
            expected,
            got: candidate.index,
        });
    }

    if candidate.prev_hash != predecessor.hash {
        return Err(LinkError::PrevHashMismatch {
            index: candidate.index,
            expected: predecessor.hash.clone(),
            got: candidate.prev_hash.clone(),
        });
    }

    let computed = candidate.compute_hash();
    if computed != candidate.hash {
        return Err(LinkError::HashMismatch {
            index: candidate.index,
            stored: candidate.hash.clone(),
            computed,
        });
    }

    Ok(())
}

/// `true` iff `candidate` validly extends `predecessor`.
///
/// Rejections are logged at debug level with the failing check.
pub fn is_valid(candidate: &Block, predecessor: &Block) -> bool {
    match validate_link(candidate, predecessor) {
        Ok(()) => true,
        Err(reason) => {
            tracing::debug!(index = candidate.index, %reason, "block rejected");
            false
        }
    }
}

/// Check that `block` has the shape of a genesis block and an honest hash.
pub fn validate_genesis(block: &Block) -> Result<(), GenesisError> {
    if block.index != GENESIS_INDEX {
        return Err(GenesisError::NonZeroIndex(block.index));
    }
    if block.prev_hash != GENESIS_PREV_HASH {
        return Err(GenesisError::HasPredecessor(block.prev_hash.clone()));
    }
    let computed = block.compute_hash();
    if computed != block.hash {
        return Err(GenesisError::HashMismatch {
            stored: block.hash.clone(),
            computed,
        });
    }
    Ok(())
}
