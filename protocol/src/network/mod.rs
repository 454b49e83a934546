//! # Network Module
//!
//! Peer-facing logic that does not care how bytes move. Nodes exchange
//! three messages: "send me your tip", "send me your chain", and "here are
//! some blocks". The [`sync::SyncEngine`] decides what a batch of received
//! blocks means for the local chain.
//!
//! Connections, peer lists, and framing belong to the transport layer in
//! the node binary.

pub mod sync;

pub use sync::{MessageResult, PeerMessage, SyncEngine, SyncError, SyncOutcome};
