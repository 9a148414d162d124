//! Benchmarks for full control ticks across all four channels.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use quad_envgen::{
    io::{DigitalInput, IoFrame},
    settings::{CvMapping, EnvelopeType, TriggerDelayMode},
    ChannelConfig, EnvelopeSetting as S, QuadEngine,
};

use crate::TICK_COUNTS;

/// Busy patch: every feature switched on somewhere.
fn busy_engine() -> QuadEngine {
    let mut engine = QuadEngine::new();
    let configs = [
        ChannelConfig::new(DigitalInput::Tr1)
            .with(S::Type, EnvelopeType::AdarL4 as i32)
            .with(S::Cv1, CvMapping::Adr as i32),
        ChannelConfig::new(DigitalInput::Tr2)
            .with(S::Type, EnvelopeType::Adsr as i32)
            .with(S::EuclideanLength, 16)
            .with(S::EuclideanFill, 5),
        ChannelConfig::new(DigitalInput::Tr3)
            .with(S::TriggerDelayMode, TriggerDelayMode::Ring as i32)
            .with(S::TriggerDelayCount, 24)
            .with(S::TriggerDelayMilliseconds, 250),
        // D follows A's end of cycle.
        ChannelConfig::new(DigitalInput::Tr4).with(S::TriggerInput, 4),
    ];
    for (i, config) in configs.into_iter().enumerate() {
        let _ = engine.load(i, config);
    }
    engine
}

pub fn bench_quad(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/quad");

    for &ticks in TICK_COUNTS {
        let mut idle = QuadEngine::new();
        let io = IoFrame::new();
        group.bench_with_input(BenchmarkId::new("idle", ticks), &ticks, |b, &ticks| {
            b.iter(|| {
                for _ in 0..ticks {
                    black_box(idle.process(&io, &[0; 4]));
                }
            })
        });

        let mut busy = busy_engine();
        group.bench_with_input(BenchmarkId::new("busy", ticks), &ticks, |b, &ticks| {
            let mut io = IoFrame::new();
            let mut n = 0u32;
            b.iter(|| {
                for _ in 0..ticks {
                    n = n.wrapping_add(1);
                    if n % 97 == 0 {
                        for input in DigitalInput::ALL {
                            io.trigger(input);
                        }
                    }
                    black_box(busy.process(&io, &[300, -200, 0, 1500]));
                    io.clear_edges();
                }
            })
        });
    }

    group.finish();
}
