//! # Chain Store
//!
//! The node's canonical chain, shared between request handlers, the sync
//! engine, and whoever else holds an `Arc<ChainStore>`.
//!
//! ## Concurrency
//!
//! The block sequence sits behind a single `parking_lot::RwLock`. Appends,
//! mining, and replacement take the write lock; tip, length, and snapshot
//! reads take the read lock. Mining generates, validates, and appends under
//! one write guard, so two concurrent submissions can never both extend the
//! same tip.
//!
//! Genesis is written in the constructor. There is no window in which a
//! reader can observe an empty store.
//!
//! ## Replacement policy
//!
//! Longest chain wins: a candidate replaces the current chain iff it has
//! strictly more blocks. Under [`ReplacePolicy::Validated`] (the default)
//! the candidate must also be a valid chain from genesis to tip, starting
//! from the same genesis block as ours.
//! [`ReplacePolicy::LengthOnly`] skips that check and trusts the peer.

use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::block::{generate_block, Block};
use super::chain::{Chain, ChainError};
use super::validation::{validate_link, LinkError};

// ---------------------------------------------------------------------------
// ReplacePolicy
// ---------------------------------------------------------------------------

/// How much a candidate chain is checked before it may replace ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Genesis shape plus every consecutive link must validate.
    #[default]
    Validated,
    /// Compare lengths only.
    LengthOnly,
}

impl fmt::Display for ReplacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacePolicy::Validated => f.write_str("validated"),
            ReplacePolicy::LengthOnly => f.write_str("length_only"),
        }
    }
}

impl FromStr for ReplacePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "validated" => Ok(ReplacePolicy::Validated),
            "length_only" => Ok(ReplacePolicy::LengthOnly),
            other => Err(format!(
                "unknown replace policy '{}', expected 'validated' or 'length-only'",
                other
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// ReplaceOutcome
// ---------------------------------------------------------------------------

/// What `replace_chain` did with an acceptable candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReplaceOutcome {
    /// The candidate was longer and now is the chain.
    Replaced {
        /// Block count before the swap.
        previous_len: usize,
        /// Block count after the swap.
        new_len: usize,
    },
    /// The candidate was not longer. Nothing changed.
    Unchanged {
        /// Our block count.
        current_len: usize,
        /// The candidate's block count.
        candidate_len: usize,
    },
}

impl ReplaceOutcome {
    /// Whether the store now holds the candidate.
    pub fn is_replaced(&self) -> bool {
        matches!(self, ReplaceOutcome::Replaced { .. })
    }
}

// ---------------------------------------------------------------------------
// ChainStore
// ---------------------------------------------------------------------------

/// Thread-safe owner of the canonical chain.
#[derive(Debug)]
pub struct ChainStore {
    blocks: RwLock<Vec<Block>>,
    policy: ReplacePolicy,
}

impl ChainStore {
    /// A store holding the canonical genesis block, with the default policy.
    pub fn new() -> Self {
        Self::from_chain(Chain::default(), ReplacePolicy::default())
    }

    /// A store holding the canonical genesis block, with `policy`.
    pub fn with_policy(policy: ReplacePolicy) -> Self {
        Self::from_chain(Chain::default(), policy)
    }

    /// A store starting from a custom genesis block.
    pub fn with_genesis(genesis: Block, policy: ReplacePolicy) -> Result<Self, ChainError> {
        Ok(Self::from_chain(Chain::new(genesis)?, policy))
    }

    /// A store starting from an already-validated chain.
    pub fn from_chain(chain: Chain, policy: ReplacePolicy) -> Self {
        let blocks = chain.into_blocks();
        tracing::info!(
            len = blocks.len(),
            genesis = %blocks[0].hash,
            %policy,
            "chain store initialized"
        );
        Self {
            blocks: RwLock::new(blocks),
            policy,
        }
    }

    /// The replacement policy this store enforces.
    pub fn policy(&self) -> ReplacePolicy {
        self.policy
    }

    /// A copy of the current tip.
    pub fn latest_block(&self) -> Block {
        let blocks = self.blocks.read();
        blocks[blocks.len() - 1].clone()
    }

    /// Number of blocks, genesis included. Never zero.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Always `false`; the store is created with its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    /// The block at `index`, if we have one.
    pub fn get(&self, index: u64) -> Option<Block> {
        let i = usize::try_from(index).ok()?;
        self.blocks.read().get(i).cloned()
    }

    /// A snapshot of every block, in order.
    pub fn blocks(&self) -> Vec<Block> {
        self.blocks.read().clone()
    }

    /// Append `block` if it validly extends the current tip.
    pub fn append(&self, block: Block) -> Result<(), LinkError> {
        let mut blocks = self.blocks.write();
        let tip = &blocks[blocks.len() - 1];
        if let Err(reason) = validate_link(&block, tip) {
            tracing::warn!(index = block.index, %reason, "rejected block append");
            return Err(reason);
        }
        tracing::info!(index = block.index, hash = %block.hash, value = block.value, "block appended");
        blocks.push(block);
        Ok(())
    }

    /// Record `value` in a new block on top of the current tip.
    ///
    /// Generation, validation, and append happen under one write lock.
    /// Fails only when the tip's index is `u64::MAX`, with
    /// [`LinkError::IndexExhausted`]; the store is left unchanged.
    pub fn mine(&self, value: i64) -> Result<Block, LinkError> {
        let mut blocks = self.blocks.write();
        let tip = &blocks[blocks.len() - 1];
        let block = generate_block(tip, value);
        validate_link(&block, tip)?;
        tracing::info!(index = block.index, hash = %block.hash, value, "block mined");
        blocks.push(block.clone());
        Ok(block)
    }

    /// Replace the chain with `candidate` iff it is strictly longer.
    ///
    /// Shorter or equal candidates leave the store untouched and return
    /// [`ReplaceOutcome::Unchanged`]. Under [`ReplacePolicy::Validated`] a
    /// candidate that is not a valid chain, or that starts from a different
    /// genesis block, returns the reason, whatever its length.
    pub fn replace_chain(&self, candidate: Vec<Block>) -> Result<ReplaceOutcome, ChainError> {
        if self.policy == ReplacePolicy::Validated {
            if let Err(e) = Chain::validate(&candidate) {
                tracing::warn!(candidate_len = candidate.len(), error = %e, "rejected candidate chain");
                return Err(e);
            }
        }

        let mut blocks = self.blocks.write();
        let current_len = blocks.len();
        let candidate_len = candidate.len();

        if self.policy == ReplacePolicy::Validated {
            if let Some(first) = candidate.first() {
                if *first != blocks[0] {
                    let err = ChainError::GenesisMismatch {
                        expected: blocks[0].hash.clone(),
                        got: first.hash.clone(),
                    };
                    tracing::warn!(candidate_len, error = %err, "rejected candidate chain");
                    return Err(err);
                }
            }
        }

        if candidate_len <= current_len {
            tracing::debug!(current_len, candidate_len, "candidate chain not longer, keeping ours");
            return Ok(ReplaceOutcome::Unchanged {
                current_len,
                candidate_len,
            });
        }

        *blocks = candidate;
        tracing::info!(
            previous_len = current_len,
            new_len = candidate_len,
            "replaced chain with longer candidate"
        );
        Ok(ReplaceOutcome::Replaced {
            previous_len: current_len,
            new_len: candidate_len,
        })
    }
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn chain_of(len: usize) -> Vec<Block> {
        let mut blocks = vec![Block::genesis()];
        while blocks.len() < len {
            let next = generate_block(blocks.last().unwrap(), blocks.len() as i64 * 10);
            blocks.push(next);
        }
        blocks
    }

    #[test]
    fn new_store_holds_genesis() {
        let store = ChainStore::new();
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert_eq!(store.latest_block(), Block::genesis());
        assert_eq!(store.policy(), ReplacePolicy::Validated);
    }

    #[test]
    fn custom_genesis_must_be_genesis() {
        let not_genesis = generate_block(&Block::genesis(), 1);
        assert!(ChainStore::with_genesis(not_genesis, ReplacePolicy::Validated).is_err());

        let custom = Block::genesis_at("2026-10-16T00:00:00Z");
        let store = ChainStore::with_genesis(custom.clone(), ReplacePolicy::Validated).unwrap();
        assert_eq!(store.latest_block(), custom);
    }

    #[test]
    fn mine_appends_valid_blocks() {
        let store = ChainStore::new();
        let b1 = store.mine(50).unwrap();
        let b2 = store.mine(30).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(b2.prev_hash, b1.hash);
        assert_eq!(store.get(2), Some(b2));
        assert!(Chain::validate(&store.blocks()).is_ok());
    }

    #[test]
    fn append_rejects_stale_block() {
        let store = ChainStore::new();
        let genesis = store.latest_block();
        store.mine(1).unwrap();

        let stale = generate_block(&genesis, 2);
        assert!(matches!(
            store.append(stale),
            Err(LinkError::IndexMismatch { expected: 2, got: 1 })
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn shorter_or_equal_candidate_is_a_no_op() {
        let store = ChainStore::new();
        store.mine(1).unwrap();
        store.mine(2).unwrap();
        let before = store.blocks();

        let equal = chain_of(3);
        let outcome = store.replace_chain(equal).unwrap();
        assert_eq!(
            outcome,
            ReplaceOutcome::Unchanged {
                current_len: 3,
                candidate_len: 3
            }
        );
        assert_eq!(store.blocks(), before);

        let shorter = chain_of(2);
        assert!(!store.replace_chain(shorter).unwrap().is_replaced());
        assert_eq!(store.blocks(), before);
    }

    #[test]
    fn longer_candidate_replaces_block_for_block() {
        let store = ChainStore::new();
        store.mine(1).unwrap();

        let candidate = chain_of(5);
        let outcome = store.replace_chain(candidate.clone()).unwrap();
        assert_eq!(
            outcome,
            ReplaceOutcome::Replaced {
                previous_len: 2,
                new_len: 5
            }
        );
        assert_eq!(store.blocks(), candidate);
    }

    #[test]
    fn validated_policy_rejects_broken_longer_chain() {
        let store = ChainStore::new();
        let mut candidate = chain_of(5);
        candidate[2].value = -1;

        let err = store.replace_chain(candidate).unwrap_err();
        assert!(matches!(err, ChainError::InvalidLink { position: 2, .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn length_only_policy_accepts_broken_longer_chain() {
        let store = ChainStore::with_policy(ReplacePolicy::LengthOnly);
        let mut candidate = chain_of(5);
        candidate[2].value = -1;

        assert!(store.replace_chain(candidate.clone()).unwrap().is_replaced());
        assert_eq!(store.blocks(), candidate);
    }

    #[test]
    fn validated_policy_rejects_foreign_genesis() {
        let custom = Block::genesis_at("2026-10-16T00:00:00Z");
        let store = ChainStore::with_genesis(custom.clone(), ReplacePolicy::Validated).unwrap();

        let foreign = chain_of(4);
        let err = store.replace_chain(foreign).unwrap_err();
        assert_eq!(
            err,
            ChainError::GenesisMismatch {
                expected: custom.hash.clone(),
                got: Block::genesis().hash,
            }
        );
        assert_eq!(store.blocks(), vec![custom]);
    }

    #[test]
    fn length_only_policy_ignores_genesis_identity() {
        let custom = Block::genesis_at("2026-10-16T00:00:00Z");
        let store = ChainStore::with_genesis(custom, ReplacePolicy::LengthOnly).unwrap();
        assert!(store.replace_chain(chain_of(3)).unwrap().is_replaced());
    }

    #[test]
    fn mining_past_max_index_is_an_error() {
        let store = ChainStore::with_policy(ReplacePolicy::LengthOnly);
        let mut forged = generate_block(&Block::genesis(), 1);
        forged.index = u64::MAX;
        forged.hash = forged.compute_hash();
        assert!(store
            .replace_chain(vec![Block::genesis(), forged])
            .unwrap()
            .is_replaced());

        assert_eq!(store.mine(1), Err(LinkError::IndexExhausted(u64::MAX)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn empty_candidate_never_replaces() {
        let lenient = ChainStore::with_policy(ReplacePolicy::LengthOnly);
        assert!(!lenient.replace_chain(Vec::new()).unwrap().is_replaced());
        assert_eq!(lenient.len(), 1);

        let strict = ChainStore::new();
        assert_eq!(strict.replace_chain(Vec::new()), Err(ChainError::Empty));
    }

    #[test]
    fn concurrent_mining_keeps_chain_contiguous() {
        let store = Arc::new(ChainStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.mine(t * 100 + i).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let blocks = store.blocks();
        assert_eq!(blocks.len(), 1 + 8 * 25);
        assert!(Chain::validate(&blocks).is_ok());
    }

    #[test]
    fn policy_parses_from_str() {
        assert_eq!("validated".parse(), Ok(ReplacePolicy::Validated));
        assert_eq!("length-only".parse(), Ok(ReplacePolicy::LengthOnly));
        assert_eq!("LENGTH_ONLY".parse(), Ok(ReplacePolicy::LengthOnly));
        assert!("longest".parse::<ReplacePolicy>().is_err());
        assert_eq!(ReplacePolicy::LengthOnly.to_string(), "length_only");
    }
}
