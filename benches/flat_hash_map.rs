#![allow(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::similar_names
)]
use std::collections::HashMap;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use proptest::{
    collection::vec,
    prelude::{Strategy, any},
    strategy::ValueTree,
    test_runner::TestRunner,
};
use swisstable::FlatHashMap;

const ITEMS_AMOUNT: usize = 1000;
const SAMPLE_SIZE: usize = 10;

fn hash_map_benches(c: &mut Criterion) {
    let mut runner = TestRunner::default();
    let items = vec(any::<(String, String)>(), ITEMS_AMOUNT)
        .new_tree(&mut runner)
        .unwrap()
        .current();

    let mut group = c.benchmark_group("Hash map comparison benchmark");
    group.sample_size(SAMPLE_SIZE);
    let mut flat_map = FlatHashMap::new();
    let mut rust_map = HashMap::new();
    group.bench_function("flat insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                flat_map.insert(key, value);
            }
        });
    });
    group.bench_function("rust std insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                rust_map.insert(key, value);
            }
        });
    });
    group.bench_function("flat get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                black_box(flat_map.get(key));
            }
        });
    });
    group.bench_function("rust std get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                black_box(rust_map.get(key));
            }
        });
    });
    group.bench_function("flat remove and reinsert", |b| {
        b.iter(|| {
            for (key, value) in &items {
                if let Some(old) = flat_map.remove(key) {
                    flat_map.insert(key.clone(), old);
                } else {
                    flat_map.insert(key.clone(), value.clone());
                }
            }
        });
    });
    group.finish();
}

fn integer_key_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("Integer keys");
    group.sample_size(SAMPLE_SIZE);
    group.bench_function("flat fill 10k", |b| {
        b.iter(|| {
            let map: FlatHashMap<u64, u64> = (0..10_000_u64).map(|i| (i, i)).collect();
            black_box(map.len())
        });
    });
    group.bench_function("rust std fill 10k", |b| {
        b.iter(|| {
            let map: HashMap<u64, u64> = (0..10_000_u64).map(|i| (i, i)).collect();
            black_box(map.len())
        });
    });
    group.finish();
}

criterion_group!(benches, hash_map_benches, integer_key_benches);

criterion_main!(benches);
