// Ledger benchmarks.
//
// Covers block hashing, single-link validation, whole-chain validation at a
// few lengths, and mining onto a shared store.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cashchain_protocol::storage::{
    calculate_hash, generate_block, is_valid, Block, Chain, ChainStore,
};

fn build_chain(len: usize) -> Vec<Block> {
    let mut blocks = vec![Block::genesis()];
    while blocks.len() < len {
        let next = generate_block(blocks.last().expect("non-empty"), blocks.len() as i64);
        blocks.push(next);
    }
    blocks
}

fn bench_hash(c: &mut Criterion) {
    let block = generate_block(&Block::genesis(), 1_000);
    c.bench_function("block/hash", |b| {
        b.iter(|| calculate_hash(black_box(&block)));
    });
}

fn bench_is_valid(c: &mut Criterion) {
    let genesis = Block::genesis();
    let block = generate_block(&genesis, 1_000);
    c.bench_function("block/is_valid", |b| {
        b.iter(|| is_valid(black_box(&block), black_box(&genesis)));
    });
}

fn bench_validate_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/validate");
    for len in [10usize, 100, 1_000] {
        let blocks = build_chain(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &blocks, |b, blocks| {
            b.iter(|| Chain::validate(black_box(blocks)));
        });
    }
    group.finish();
}

fn bench_mine(c: &mut Criterion) {
    c.bench_function("store/mine", |b| {
        let store = ChainStore::new();
        b.iter(|| store.mine(black_box(42)));
    });
}

criterion_group!(
    benches,
    bench_hash,
    bench_is_valid,
    bench_validate_chain,
    bench_mine
);
criterion_main!(benches);
