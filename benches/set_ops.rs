//! Benchmarks for set operations against std HashSet.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hash_trie_set::{DefaultComparer, HashTrieSet};
use std::collections::HashSet;

fn generate_url_like_keys(n: usize) -> Vec<String> {
    let domains = ["example.com", "test.org", "demo.net", "sample.io"];
    let paths = ["users", "posts", "comments", "api/v1", "api/v2"];

    (0..n)
        .map(|i| {
            let domain = domains[i % domains.len()];
            let path = paths[(i / domains.len()) % paths.len()];
            let id = i / (domains.len() * paths.len());
            format!("{}/{}/{}", domain, path, id)
        })
        .collect()
}

fn build(keys: &[String]) -> HashTrieSet<String> {
    HashTrieSet::from_iter_with(keys.iter().cloned(), &DefaultComparer)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_url_like_keys(size);

        group.bench_with_input(BenchmarkId::new("HashTrieSet", size), &keys, |b, keys| {
            b.iter(|| black_box(build(keys)));
        });

        group.bench_with_input(BenchmarkId::new("HashSet", size), &keys, |b, keys| {
            b.iter(|| {
                let set: HashSet<String> = keys.iter().cloned().collect();
                black_box(set)
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_url_like_keys(size);
        let trie = build(&keys);
        let std_set: HashSet<String> = keys.iter().cloned().collect();

        group.bench_with_input(BenchmarkId::new("HashTrieSet", size), &keys, |b, keys| {
            b.iter(|| {
                let hits = keys.iter().filter(|k| trie.contains(k, &DefaultComparer)).count();
                black_box(hits)
            });
        });

        group.bench_with_input(BenchmarkId::new("HashSet", size), &keys, |b, keys| {
            b.iter(|| {
                let hits = keys.iter().filter(|k| std_set.contains(*k)).count();
                black_box(hits)
            });
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_then_write");

    for size in [1_000, 10_000, 100_000] {
        let keys = generate_url_like_keys(size);
        let trie = build(&keys);
        let std_set: HashSet<String> = keys.iter().cloned().collect();
        let extra = "other.dev/new/0".to_string();

        group.bench_function(BenchmarkId::new("HashTrieSet", size), |b| {
            b.iter(|| {
                let mut copy = trie.clone_freeze();
                copy.insert(extra.clone(), &DefaultComparer);
                black_box(copy)
            });
        });

        group.bench_function(BenchmarkId::new("HashSet", size), |b| {
            b.iter(|| {
                let mut copy = std_set.clone();
                copy.insert(extra.clone());
                black_box(copy)
            });
        });
    }

    group.finish();
}

fn bench_algebra(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersect");

    for size in [1_000, 10_000] {
        let keys = generate_url_like_keys(size);
        let a = build(&keys);
        let b_set = build(&keys[size / 2..]);

        group.bench_function(BenchmarkId::new("HashTrieSet", size), |b| {
            b.iter(|| {
                let mut x = a.clone();
                black_box(x.intersect_with_set(&b_set, &DefaultComparer))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup, bench_snapshot, bench_algebra);
criterion_main!(benches);
