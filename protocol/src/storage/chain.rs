//! In-memory chain: an ordered, validated sequence of blocks.
//!
//! A [`Chain`] is never empty and always satisfies the adjacency invariant
//! between every consecutive pair. The only ways in are
//! [`Chain::from_blocks`] (full validation) and [`Chain::append`]
//! (validation against the tip), so holding a `Chain` is proof of validity.

use thiserror::Error;

use super::block::Block;
use super::validation::{validate_genesis, validate_link, GenesisError, LinkError};

/// Why a sequence of blocks is not a valid chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// A chain has at least its genesis block.
    #[error("chain is empty")]
    Empty,

    /// The first block is not a well-formed genesis block.
    #[error("invalid genesis block: {0}")]
    InvalidGenesis(#[from] GenesisError),

    /// The block at `position` does not extend the block before it.
    #[error("invalid link at position {position}: {source}")]
    InvalidLink {
        /// Offset of the offending block in the sequence (always >= 1).
        position: usize,
        /// Which check failed.
        #[source]
        source: LinkError,
    },

    /// The chain starts from a different genesis block than ours.
    #[error("genesis mismatch: expected {expected}, got {got}")]
    GenesisMismatch {
        /// Hash of our genesis block.
        expected: String,
        /// Hash of the candidate's first block.
        got: String,
    },
}

/// Ordered chain of validated blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// A chain holding only `genesis`.
    pub fn new(genesis: Block) -> Result<Self, ChainError> {
        validate_genesis(&genesis)?;
        Ok(Self {
            blocks: vec![genesis],
        })
    }

    /// Validate `blocks` end to end and wrap them.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, ChainError> {
        Self::validate(&blocks)?;
        Ok(Self { blocks })
    }

    /// Check the genesis shape of the first block and every consecutive link.
    ///
    /// Stops at the first problem. Does not allocate.
    pub fn validate(blocks: &[Block]) -> Result<(), ChainError> {
        let first = blocks.first().ok_or(ChainError::Empty)?;
        validate_genesis(first)?;

        for (position, pair) in blocks.windows(2).enumerate() {
            validate_link(&pair[1], &pair[0]).map_err(|source| ChainError::InvalidLink {
                position: position + 1,
                source,
            })?;
        }

        Ok(())
    }

    /// Appends a block after validating it against the tip.
    pub fn append(&mut self, block: Block) -> Result<(), LinkError> {
        validate_link(&block, self.tip())?;
        self.blocks.push(block);
        Ok(())
    }

    /// Returns the genesis block.
    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// Returns the latest block.
    pub fn tip(&self) -> &Block {
        // Non-empty by construction.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Returns the number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the block at `index`, if any.
    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Returns the blocks in order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Consumes the chain, returning its blocks.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            blocks: vec![Block::genesis()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block::generate_block;

    fn build(values: &[i64]) -> Vec<Block> {
        let mut blocks = vec![Block::genesis()];
        for &v in values {
            let next = generate_block(blocks.last().unwrap(), v);
            blocks.push(next);
        }
        blocks
    }

    #[test]
    fn default_chain_holds_genesis() {
        let chain = Chain::default();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.tip(), chain.genesis());
        assert!(!chain.is_empty());
    }

    #[test]
    fn append_extends_tip() {
        let mut chain = Chain::default();
        let block = generate_block(chain.tip(), 50);
        chain.append(block.clone()).expect("valid block");
        assert_eq!(chain.tip(), &block);
        assert_eq!(chain.get(1), Some(&block));
        assert_eq!(chain.get(2), None);
    }

    #[test]
    fn append_rejects_invalid_block() {
        let mut chain = Chain::default();
        let mut block = generate_block(chain.tip(), 50);
        block.value = 51;
        assert!(chain.append(block).is_err());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn from_blocks_accepts_valid_sequence() {
        let chain = Chain::from_blocks(build(&[50, 30, -10])).expect("valid");
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.tip().value, -10);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        assert_eq!(Chain::validate(&[]), Err(ChainError::Empty));
    }

    #[test]
    fn bad_genesis_is_rejected() {
        let blocks = build(&[1, 2]);
        let tail = blocks[1..].to_vec();
        assert!(matches!(
            Chain::validate(&tail),
            Err(ChainError::InvalidGenesis(GenesisError::NonZeroIndex(1)))
        ));
    }

    #[test]
    fn broken_link_reports_position() {
        let mut blocks = build(&[1, 2, 3, 4]);
        blocks[3].value = 9999;

        match Chain::validate(&blocks) {
            Err(ChainError::InvalidLink { position, source }) => {
                assert_eq!(position, 3);
                assert!(matches!(source, LinkError::HashMismatch { index: 3, .. }));
            }
            other => panic!("expected InvalidLink, got {:?}", other),
        }
    }

    #[test]
    fn reordered_blocks_are_rejected() {
        let mut blocks = build(&[1, 2, 3]);
        blocks.swap(1, 2);
        assert!(matches!(
            Chain::validate(&blocks),
            Err(ChainError::InvalidLink { position: 1, .. })
        ));
    }

    #[test]
    fn new_rejects_non_genesis() {
        let block = generate_block(&Block::genesis(), 1);
        assert!(Chain::new(block).is_err());
    }
}
