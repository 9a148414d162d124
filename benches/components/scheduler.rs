//! Benchmarks for the trigger delay table.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use quad_envgen::engine::TriggerDelayScheduler;
use quad_envgen::settings::{TriggerDelayMode, MAX_DELAYED_TRIGGERS};

pub fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("components/scheduler");

    for &filled in &[0usize, 8, MAX_DELAYED_TRIGGERS] {
        let mut table = TriggerDelayScheduler::new();
        for k in 0..filled {
            table.submit(TriggerDelayMode::Ring, MAX_DELAYED_TRIGGERS, 1_000_000 + k as u32 * 60);
        }

        group.bench_with_input(BenchmarkId::new("tick", filled), &filled, |b, _| {
            b.iter_batched_ref(
                || table.clone(),
                |t| black_box(t.tick()),
                criterion::BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("submit_ring", filled), &filled, |b, _| {
            b.iter_batched_ref(
                || table.clone(),
                |t| black_box(t.submit(TriggerDelayMode::Ring, MAX_DELAYED_TRIGGERS, 500_000)),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}
