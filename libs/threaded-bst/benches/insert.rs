use std::collections::BTreeSet;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::seq::SliceRandom;
use threaded_bst::{NodePool, RawRegion, ThreadedTree};

fn tree_insertions(buf: &mut [u8], keys: &[u64]) {
    let mut tree = ThreadedTree::<u64>::from_region(RawRegion::new(buf));

    for key in keys {
        tree.insert(*key);
    }

    black_box(&tree);
}

fn btreeset_insertions(keys: &[u64]) {
    let mut set = BTreeSet::new();

    for key in keys {
        set.insert(*key);
    }

    black_box(set);
}

fn bench_insertions(c: &mut Criterion) {
    let mut rng = rand::rng();

    let mut group = c.benchmark_group("Insertions");
    for num_entries in (10..10_000).step_by(1000) {
        let mut keys: Vec<u64> = (0..num_entries).collect();
        keys.shuffle(&mut rng);

        let mut buf = vec![0u8; NodePool::<u64>::required_bytes(keys.len())];

        group.bench_with_input(
            BenchmarkId::new("BTreeSet", num_entries),
            keys.as_slice(),
            |b, keys| b.iter(|| btreeset_insertions(keys)),
        );

        group.bench_with_input(
            BenchmarkId::new("ThreadedTree", num_entries),
            keys.as_slice(),
            |b, keys| b.iter(|| tree_insertions(&mut buf, keys)),
        );
    }
    group.finish();
}

fn bench_copy(c: &mut Criterion) {
    let mut rng = rand::rng();

    let mut group = c.benchmark_group("Copy");
    for num_entries in (10..10_000).step_by(1000) {
        let mut keys: Vec<u64> = (0..num_entries).collect();
        keys.shuffle(&mut rng);

        let mut buf = vec![0u8; NodePool::<u64>::required_bytes(keys.len() * 2)];
        let pool = RawRegion::new(&mut buf).rebind::<u64>();
        let src = ThreadedTree::from_iter_in(keys.iter().copied(), &pool);
        let mut dst = ThreadedTree::new_in(&pool);

        group.bench_function(BenchmarkId::new("ThreadedTree", num_entries), |b| {
            b.iter(|| src.copy_into(black_box(&mut dst)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insertions, bench_copy);
criterion_main!(benches);
