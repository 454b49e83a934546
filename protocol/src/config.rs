//! # Protocol Configuration & Constants
//!
//! Every magic number in the ledger lives here. Changing any value in the
//! "consensus" group makes a node unable to exchange chains with nodes that
//! kept the old value, so treat them as frozen.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Protocol version string reported by nodes.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Consensus
// ---------------------------------------------------------------------------

/// Name of the hash function used for block digests.
pub const PRIMARY_HASH_FUNCTION: &str = "SHA-256";

/// Raw digest length in bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Length of a block hash rendered as lowercase hex.
pub const HASH_HEX_LENGTH: usize = HASH_OUTPUT_LENGTH * 2;

/// Index of the genesis block.
pub const GENESIS_INDEX: u64 = 0;

/// Cash value recorded by the genesis block.
pub const GENESIS_VALUE: i64 = 0;

/// Predecessor hash of the genesis block. There is no predecessor.
pub const GENESIS_PREV_HASH: &str = "";

/// Fixed genesis timestamp. Every node starts from the same genesis block,
/// otherwise no two nodes could ever agree on a chain.
pub const GENESIS_TIMESTAMP: &str = "2018-06-05T16:00:00Z";

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default HTTP API port.
pub const DEFAULT_HTTP_PORT: u16 = 3001;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 3002;

/// Default bind address for node listeners.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Capacity of the broadcast channel that feeds WebSocket subscribers.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_lengths_agree() {
        assert_eq!(HASH_OUTPUT_LENGTH, 32);
        assert_eq!(HASH_HEX_LENGTH, 64);
    }

    #[test]
    fn test_genesis_timestamp_is_rfc3339() {
        assert!(chrono::DateTime::parse_from_rfc3339(GENESIS_TIMESTAMP).is_ok());
    }

    #[test]
    fn test_genesis_has_no_predecessor() {
        assert!(GENESIS_PREV_HASH.is_empty());
        assert_eq!(GENESIS_INDEX, 0);
    }

    #[test]
    fn test_ports_are_distinct() {
        assert_ne!(DEFAULT_HTTP_PORT, DEFAULT_METRICS_PORT);
    }
}
