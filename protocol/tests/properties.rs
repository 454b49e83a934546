//! Property tests for hashing, block generation, and validation.

use proptest::prelude::*;

use cashchain_protocol::storage::{
    compute_block_hash, is_valid, validate_link, Block, ChainStore, LinkError,
};

/// Any block that validly extends genesis, with arbitrary value and timestamp.
fn arb_successor() -> impl Strategy<Value = (Block, Block)> {
    (any::<i64>(), "[ -~]{0,40}").prop_map(|(value, timestamp)| {
        let genesis = Block::genesis();
        let next = Block::next_at(&genesis, value, timestamp);
        (genesis, next)
    })
}

proptest! {
    #[test]
    fn prop_hash_is_deterministic(
        index in any::<u64>(),
        timestamp in ".{0,32}",
        value in any::<i64>(),
        prev_hash in "[0-9a-f]{0,64}",
    ) {
        let a = compute_block_hash(index, &timestamp, value, &prev_hash);
        let b = compute_block_hash(index, &timestamp, value, &prev_hash);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), 64);
    }

    #[test]
    fn prop_generated_block_is_valid((genesis, next) in arb_successor()) {
        prop_assert!(is_valid(&next, &genesis));
    }

    #[test]
    fn prop_mined_block_is_valid(values in prop::collection::vec(any::<i64>(), 1..16)) {
        let store = ChainStore::new();
        for value in values {
            let tip = store.latest_block();
            let block = store.mine(value).expect("mining never fails on a fresh tip");
            prop_assert!(is_valid(&block, &tip));
        }
    }

    #[test]
    fn prop_tampered_value_is_rejected(
        (genesis, next) in arb_successor(),
        delta in 1i64..=i64::MAX,
    ) {
        let mut tampered = next;
        tampered.value = tampered.value.wrapping_add(delta);
        prop_assert!(!is_valid(&tampered, &genesis));
    }

    #[test]
    fn prop_tampered_timestamp_is_rejected(
        (genesis, next) in arb_successor(),
        suffix in "[a-z0-9]{1,8}",
    ) {
        let mut tampered = next;
        tampered.timestamp.push_str(&suffix);
        prop_assert!(!is_valid(&tampered, &genesis));
    }

    #[test]
    fn prop_wrong_index_always_rejected(
        (genesis, next) in arb_successor(),
        index in any::<u64>(),
    ) {
        prop_assume!(index != 1);
        let mut moved = next;
        moved.index = index;
        moved.hash = moved.compute_hash();
        prop_assert_eq!(
            validate_link(&moved, &genesis),
            Err(LinkError::IndexMismatch { expected: 1, got: index })
        );
    }

    #[test]
    fn prop_wrong_prev_hash_always_rejected(
        (genesis, next) in arb_successor(),
        prev_hash in "[0-9a-f]{64}",
    ) {
        prop_assume!(prev_hash != genesis.hash);
        let mut relinked = next;
        relinked.prev_hash = prev_hash;
        relinked.hash = relinked.compute_hash();
        prop_assert!(!is_valid(&relinked, &genesis));
    }
}
