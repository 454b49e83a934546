//! # Chain Synchronization
//!
//! When a peer sends us blocks, one of four things is true:
//!
//! ```text
//! received tip ≤ our tip ........................ nothing to do
//! received tip extends our tip directly ......... append it
//! received a single block that doesn't link ..... ask for the whole chain
//! received several blocks that don't link ....... try to replace our chain
//! ```
//!
//! ## Protocol Overview
//!
//! ```text
//! Node A                              Node B
//! ──────                              ──────
//!   │  QueryLatest                      │
//!   │─────────────────────────────────▶ │
//!   │  ResponseBlockchain([tip])        │
//!   │◀───────────────────────────────── │
//!   │  (tip doesn't link)               │
//!   │  QueryAll                         │
//!   │─────────────────────────────────▶ │
//!   │  ResponseBlockchain(all blocks)   │
//!   │◀───────────────────────────────── │
//!   │  replace_chain(all blocks)        │
//! ```
//!
//! The engine is stateless apart from the store it wraps and does not own
//! any connections. It turns a message into a decision and tells the
//! caller what, if anything, to send next. Sending is the caller's problem.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::block::Block;
use crate::storage::chain::ChainError;
use crate::storage::store::{ChainStore, ReplaceOutcome};
use crate::storage::validation::LinkError;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Messages exchanged between peers.
///
/// Serialized as `{"type": "...", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PeerMessage {
    /// "What's your latest block?"
    QueryLatest,
    /// "Send me your whole chain."
    QueryAll,
    /// A batch of blocks: either a lone tip or a full chain.
    ResponseBlockchain(Vec<Block>),
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What handling a batch of received blocks did to the local chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The peer sent no blocks.
    Ignored,
    /// The peer is not ahead of us.
    UpToDate {
        /// Index of our tip.
        local_index: u64,
        /// Index of the highest block received.
        remote_index: u64,
    },
    /// The peer's tip extended ours and was appended.
    Appended {
        /// The block now at our tip.
        block: Block,
    },
    /// The peer is ahead but a single block isn't enough to catch up.
    NeedFullChain {
        /// Index of our tip.
        local_index: u64,
        /// Index of the received block.
        remote_index: u64,
    },
    /// The received chain went through the replacement policy.
    Replace {
        /// What the store did with it.
        result: ReplaceOutcome,
    },
}

impl SyncOutcome {
    /// Whether the local chain changed.
    pub fn changed_chain(&self) -> bool {
        match self {
            SyncOutcome::Appended { .. } => true,
            SyncOutcome::Replace { result } => result.is_replaced(),
            _ => false,
        }
    }
}

/// Received blocks that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The received tip claimed to extend ours but failed validation.
    #[error("received block rejected: {0}")]
    InvalidBlock(#[from] LinkError),

    /// The received chain failed validation.
    #[error("received chain rejected: {0}")]
    InvalidChain(#[from] ChainError),
}

/// Result of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResult {
    /// Set when the message carried blocks.
    pub outcome: Option<SyncOutcome>,
    /// What to send back (or broadcast), if anything.
    pub reply: Option<PeerMessage>,
}

// ---------------------------------------------------------------------------
// SyncEngine
// ---------------------------------------------------------------------------

/// Applies peer messages to a shared [`ChainStore`].
#[derive(Debug, Clone)]
pub struct SyncEngine {
    store: Arc<ChainStore>,
}

impl SyncEngine {
    /// Wraps `store`. Cheap; clone freely.
    pub fn new(store: Arc<ChainStore>) -> Self {
        Self { store }
    }

    /// The store this engine writes to.
    pub fn store(&self) -> &Arc<ChainStore> {
        &self.store
    }

    /// `ResponseBlockchain` carrying only our tip.
    pub fn latest_message(&self) -> PeerMessage {
        PeerMessage::ResponseBlockchain(vec![self.store.latest_block()])
    }

    /// `ResponseBlockchain` carrying our whole chain.
    pub fn chain_message(&self) -> PeerMessage {
        PeerMessage::ResponseBlockchain(self.store.blocks())
    }

    /// Handle any inbound message.
    ///
    /// Queries are answered directly. Blocks go through
    /// [`handle_blockchain_response`](Self::handle_blockchain_response),
    /// and the reply is whatever [`follow_up`](Self::follow_up) suggests.
    pub fn handle_message(&self, message: PeerMessage) -> Result<MessageResult, SyncError> {
        match message {
            PeerMessage::QueryLatest => Ok(MessageResult {
                outcome: None,
                reply: Some(self.latest_message()),
            }),
            PeerMessage::QueryAll => Ok(MessageResult {
                outcome: None,
                reply: Some(self.chain_message()),
            }),
            PeerMessage::ResponseBlockchain(blocks) => {
                let outcome = self.handle_blockchain_response(blocks)?;
                let reply = self.follow_up(&outcome);
                Ok(MessageResult {
                    outcome: Some(outcome),
                    reply,
                })
            }
        }
    }

    /// Decide what a batch of received blocks means for our chain, and do it.
    pub fn handle_blockchain_response(
        &self,
        mut blocks: Vec<Block>,
    ) -> Result<SyncOutcome, SyncError> {
        blocks.sort_by_key(|b| b.index);

        let remote_tip = match blocks.last() {
            Some(b) => b.clone(),
            None => {
                tracing::debug!("peer sent an empty block list");
                return Ok(SyncOutcome::Ignored);
            }
        };
        let local_tip = self.store.latest_block();

        if remote_tip.index <= local_tip.index {
            tracing::debug!(
                local_index = local_tip.index,
                remote_index = remote_tip.index,
                "received chain is not ahead of ours"
            );
            return Ok(SyncOutcome::UpToDate {
                local_index: local_tip.index,
                remote_index: remote_tip.index,
            });
        }

        tracing::info!(
            local_index = local_tip.index,
            remote_index = remote_tip.index,
            "chain possibly behind peer"
        );

        if remote_tip.prev_hash == local_tip.hash {
            self.store.append(remote_tip.clone())?;
            return Ok(SyncOutcome::Appended { block: remote_tip });
        }

        if blocks.len() == 1 {
            tracing::info!("single block does not link, querying full chain");
            return Ok(SyncOutcome::NeedFullChain {
                local_index: local_tip.index,
                remote_index: remote_tip.index,
            });
        }

        let result = self.store.replace_chain(blocks)?;
        Ok(SyncOutcome::Replace { result })
    }

    /// The message to send after `outcome`, if any.
    ///
    /// A changed chain is announced by broadcasting the new tip. A missing
    /// history is requested with `QueryAll`.
    pub fn follow_up(&self, outcome: &SyncOutcome) -> Option<PeerMessage> {
        match outcome {
            SyncOutcome::NeedFullChain { .. } => Some(PeerMessage::QueryAll),
            o if o.changed_chain() => Some(self.latest_message()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
