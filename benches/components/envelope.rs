//! Benchmarks for the multistage curve engine.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use quad_envgen::envelope::{
    CurveEngine, CurveSettings, EnvelopeShape, GateState, LoopRegion, MultistageEnvelope,
    ShapeFamily,
};

use crate::TICK_COUNTS;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("components/envelope");

    let families = [
        (
            "adsr",
            ShapeFamily::Adsr {
                attack: 20_000,
                decay: 20_000,
                sustain: 16_000,
                release: 20_000,
            },
        ),
        (
            "adar_looped",
            ShapeFamily::Adar {
                attack: 8_000,
                decay: 8_000,
                level: 10_000,
                release: 8_000,
                looped: LoopRegion::new(0, 4),
            },
        ),
    ];

    for &ticks in TICK_COUNTS {
        for (name, family) in families {
            let mut env = MultistageEnvelope::new();
            env.set_family(family);
            env.configure(&CurveSettings {
                attack_shape: EnvelopeShape::Quartic,
                decay_shape: EnvelopeShape::Exponential,
                release_shape: EnvelopeShape::Sine,
                ..CurveSettings::default()
            });

            group.bench_with_input(BenchmarkId::new(name, ticks), &ticks, |b, &ticks| {
                b.iter(|| {
                    let mut acc = 0u32;
                    acc += u32::from(env.render(GateState::RISING | GateState::RAISED));
                    for _ in 1..ticks {
                        acc += u32::from(env.render(black_box(GateState::RAISED)));
                    }
                    black_box(acc)
                })
            });
        }
    }

    group.finish();
}
