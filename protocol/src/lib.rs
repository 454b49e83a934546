// Copyright (c) 2026 Cashchain Contributors. MIT License.
// See LICENSE for details.

//! # Cashchain Core Library
//!
//! An append-only ledger of cash values where every block commits to its
//! predecessor by SHA-256 hash. Tamper with one field anywhere in history
//! and every link after it stops checking out.
//!
//! ## Architecture
//!
//! - **crypto**: SHA-256 helpers. Nothing clever.
//! - **storage**: Blocks, the hasher, the link validator, and the
//!   synchronized chain store with its replacement policy.
//! - **network**: Transport-agnostic peer message handling. Decides whether
//!   a peer's blocks get appended, replace our chain, or are ignored.
//! - **config**: Protocol constants.
//!
//! ## Quick tour
//!
//! ```
//! use cashchain_protocol::storage::{is_valid, ChainStore};
//!
//! let store = ChainStore::new();
//! let genesis = store.latest_block();
//! let block = store.mine(50).expect("tip is always a valid predecessor");
//! assert!(is_valid(&block, &genesis));
//! assert_eq!(store.len(), 2);
//! ```

pub mod config;
pub mod crypto;
pub mod network;
pub mod storage;
