//! # Storage Module
//!
//! The ledger itself: what a block is, how it is hashed, how a block is
//! checked against its predecessor, and where the accepted chain lives.
//!
//! ## Architecture
//!
//! ```text
//! block.rs      : Block, hasher, block factory, genesis
//! validation.rs : single-link and genesis checks
//! chain.rs      : owned, validated block sequence
//! store.rs      : synchronized canonical chain + replacement policy
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! value ──▶ generate_block(tip) ──▶ validate_link(tip) ──▶ ChainStore
//!                                                            ▲
//! peer chain ──────────────▶ Chain::validate ──▶ replace_chain
//! ```
//!
//! Everything lives in memory. A restarted node begins again at genesis
//! and catches up from peers.

pub mod block;
pub mod chain;
pub mod store;
pub mod validation;

pub use block::{calculate_hash, compute_block_hash, generate_block, Block};
pub use chain::{Chain, ChainError};
pub use store::{ChainStore, ReplaceOutcome, ReplacePolicy};
pub use validation::{is_valid, validate_genesis, validate_link, GenesisError, LinkError};
