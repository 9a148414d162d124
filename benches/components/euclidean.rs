//! Benchmarks for Euclidean pattern generation and filtering.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use quad_envgen::rhythm::{euclidean_filter, euclidean_pattern};

pub fn bench_euclidean(c: &mut Criterion) {
    let mut group = c.benchmark_group("components/euclidean");

    for &(length, fill) in &[(8u32, 3u32), (16, 5), (31, 13)] {
        let label = format!("{length}_{fill}");

        group.bench_with_input(BenchmarkId::new("pattern", &label), &length, |b, _| {
            b.iter(|| euclidean_pattern(black_box(length), black_box(fill)))
        });

        group.bench_with_input(BenchmarkId::new("filter_cycle", &label), &length, |b, _| {
            b.iter(|| {
                (0..length)
                    .filter(|&n| euclidean_filter(length, fill, black_box(2), n))
                    .count()
            })
        });
    }

    group.finish();
}
