//! Benchmarks for `BpTreeMap` against `std::collections::BTreeMap`.
//!
//! Run with: `cargo bench --bench map`

use std::collections::BTreeMap;
use std::hint::black_box;
use std::time::Duration;

use bptree::BpTreeMap;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

const SIZES: &[u64] = &[1_000, 10_000];

/// Custom criterion configuration for map-level measurements.
fn custom_criterion() -> Criterion {
    Criterion::default()
        .sample_size(60)
        .measurement_time(Duration::from_secs(3))
        .warm_up_time(Duration::from_secs(1))
}

/// Every value in `0..n` exactly once, in a scrambled deterministic order.
fn scrambled(n: u64) -> Vec<u64> {
    let mut keys = Vec::with_capacity(n as usize);
    let mut x = 0u64;
    for _ in 0..n {
        x = (x + 7919) % n;
        keys.push(x);
    }
    keys
}

fn filled(keys: &[u64]) -> BpTreeMap<u64, u64> {
    keys.iter().map(|&k| (k, k)).collect()
}

/// Insert `n` scrambled keys into an empty map.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("map/insert_scrambled");

    for &n in SIZES {
        let keys = scrambled(n);
        group.throughput(Throughput::Elements(n));

        group.bench_with_input(BenchmarkId::new("bptree", n), &keys, |b, keys| {
            b.iter(|| {
                let mut map: BpTreeMap<u64, u64> = BpTreeMap::new();
                for &k in keys {
                    map.insert(black_box(k), k);
                }
                map
            });
        });

        group.bench_with_input(BenchmarkId::new("std_btree", n), &keys, |b, keys| {
            b.iter(|| {
                let mut map: BTreeMap<u64, u64> = BTreeMap::new();
                for &k in keys {
                    map.insert(black_box(k), k);
                }
                map
            });
        });
    }

    group.finish();
}

/// Point lookups over every key of a prebuilt map.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("map/get");

    for &n in SIZES {
        let keys = scrambled(n);
        let map = filled(&keys);
        let std_map: BTreeMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
        group.throughput(Throughput::Elements(n));

        group.bench_with_input(BenchmarkId::new("bptree", n), &keys, |b, keys| {
            b.iter(|| {
                let mut hits = 0u64;
                for k in keys {
                    if map.get(black_box(k)).is_some() {
                        hits += 1;
                    }
                }
                hits
            });
        });

        group.bench_with_input(BenchmarkId::new("std_btree", n), &keys, |b, keys| {
            b.iter(|| {
                let mut hits = 0u64;
                for k in keys {
                    if std_map.get(black_box(k)).is_some() {
                        hits += 1;
                    }
                }
                hits
            });
        });
    }

    group.finish();
}

/// Full in-order scans: the iterator and a raw cursor walk.
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("map/scan");

    for &n in SIZES {
        let keys = scrambled(n);
        let map = filled(&keys);
        let std_map: BTreeMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
        group.throughput(Throughput::Elements(n));

        group.bench_with_input(BenchmarkId::new("bptree_iter", n), &(), |b, _| {
            b.iter(|| map.values().sum::<u64>());
        });

        group.bench_with_input(BenchmarkId::new("bptree_cursor", n), &(), |b, _| {
            b.iter(|| {
                let mut total = 0u64;
                let mut cursor = map.cursor_front();
                while let Some(&v) = cursor.value() {
                    total += v;
                    cursor.move_next();
                }
                total
            });
        });

        group.bench_with_input(BenchmarkId::new("std_btree_iter", n), &(), |b, _| {
            b.iter(|| std_map.values().sum::<u64>());
        });
    }

    group.finish();
}

/// Remove every key from a prebuilt map in scrambled order.
fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("map/remove_scrambled");

    for &n in SIZES {
        let keys = scrambled(n);
        let map = filled(&keys);
        let std_map: BTreeMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
        group.throughput(Throughput::Elements(n));

        group.bench_with_input(BenchmarkId::new("bptree", n), &keys, |b, keys| {
            b.iter_batched(
                || map.clone(),
                |mut map| {
                    for k in keys {
                        map.remove(black_box(k));
                    }
                    map
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("std_btree", n), &keys, |b, keys| {
            b.iter_batched(
                || std_map.clone(),
                |mut map| {
                    for k in keys {
                        map.remove(black_box(k));
                    }
                    map
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = custom_criterion();
    targets = bench_insert, bench_get, bench_scan, bench_remove
}

criterion_main!(benches);
