use quad_envgen::{
    engine::{EventBus, InternalEvent},
    envelope::{CurveEngine, CurveSettings, EnvState, GateState, ShapeFamily},
    io::{
        output::{DacCalibration, DacChannel, OutputFrame},
        DigitalInput, IoFrame,
    },
    settings::{CvMapping, EnvelopeType, TriggerDelayMode},
    ChannelConfig, EnvelopeChannel, EnvelopeSetting as S, QuadEngine, SAMPLE_MAX,
};

/// Curve engine stand-in that records every gate it is handed.
#[derive(Debug, Default)]
struct Recorder {
    gates: Vec<GateState>,
}

impl Recorder {
    fn rising_ticks(&self) -> Vec<usize> {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, g)| g.contains(GateState::RISING))
            .map(|(i, _)| i)
            .collect()
    }
}

impl CurveEngine for Recorder {
    fn set_family(&mut self, _family: ShapeFamily) {}
    fn configure(&mut self, _settings: &CurveSettings) {}
    fn set_amplitude(&mut self, _amplitude: u16, _sampled: bool) {}
    fn set_max_loops(&mut self, _max_loops: u16) {}
    fn reset(&mut self) {}
    fn render(&mut self, gate: GateState) -> u16 {
        self.gates.push(gate);
        0
    }
    fn state_mask(&self) -> EnvState {
        EnvState::empty()
    }
}

fn step(channel: &mut EnvelopeChannel<Recorder>, io: &mut IoFrame) {
    let mut out = OutputFrame::default();
    channel.update(
        &*io,
        &EventBus::new(),
        &[0; 4],
        DacChannel::A,
        &DacCalibration::default(),
        &mut out,
    );
    io.clear_edges();
}

fn adsr_patch(inverted: bool) -> ChannelConfig {
    ChannelConfig::new(DigitalInput::Tr1)
        .with(S::Type, EnvelopeType::Adsr as i32)
        .with(S::Seg1Value, 64)
        .with(S::Seg2Value, 64)
        .with(S::Seg3Value, 128)
        .with(S::Seg4Value, 64)
        .with(S::Inverted, i32::from(inverted))
}

/// Hold the gate for `hold` ticks, then release for `tail` ticks.
fn run_gate(engine: &mut QuadEngine, hold: usize, tail: usize) -> Vec<u16> {
    let mut io = IoFrame::new();
    let mut samples = Vec::with_capacity(hold + tail);
    io.set_gate(DigitalInput::Tr1, true);
    for _ in 0..hold {
        engine.process(&io, &[0; 4]);
        io.clear_edges();
        samples.push(engine.channels()[0].sample());
    }
    io.set_gate(DigitalInput::Tr1, false);
    for _ in 0..tail {
        engine.process(&io, &[0; 4]);
        samples.push(engine.channels()[0].sample());
    }
    samples
}

#[test]
fn adsr_rises_holds_and_releases() {
    let mut engine = QuadEngine::new();
    engine.load(0, adsr_patch(false)).unwrap();

    let samples = run_gate(&mut engine, 2_000, 1_000);

    let peak = *samples[..2_000].iter().max().unwrap();
    assert!(peak > 32_000, "peak {peak}");

    // Segment 3 resolves to 33023 and is halved, then scaled by amplitude 127.
    let sustain = ((16_511u32 * (127 << 9)) >> 16) as u16;
    assert!(samples[1_500..2_000].iter().all(|&s| s == sustain));

    assert!(samples[2_000..2_100].windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(*samples.last().unwrap(), 0);
}

#[test]
fn inverted_output_mirrors_every_sample() {
    let mut plain = QuadEngine::new();
    plain.load(0, adsr_patch(false)).unwrap();
    let mut inverted = QuadEngine::new();
    inverted.load(0, adsr_patch(true)).unwrap();

    let a = run_gate(&mut plain, 1_200, 600);
    let b = run_gate(&mut inverted, 1_200, 600);
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(*y, SAMPLE_MAX - x);
    }
    assert_eq!(inverted.outputs().get(DacChannel::A), 65_535);
}

#[test]
fn end_of_cycle_triggers_the_next_channel_one_tick_later() {
    let mut engine = QuadEngine::new();
    let fast = ChannelConfig::new(DigitalInput::Tr1)
        .with(S::Seg1Value, 0)
        .with(S::Seg2Value, 0);
    engine.load(0, fast).unwrap();
    // On channel B, selector 4 skips B itself and lands on A.
    engine
        .load(1, ChannelConfig::new(DigitalInput::Tr2).with(S::TriggerInput, 4))
        .unwrap();

    let mut io = IoFrame::new();
    io.trigger(DigitalInput::Tr1);
    let mut a_eoc = None;
    let mut b_start = None;
    for t in 0..200 {
        engine.process(&io, &[0; 4]);
        io.clear_edges();
        let a = engine.channels()[0]
            .internal_events()
            .contains(InternalEvent::EndOfCycle.state_flag());
        if a && a_eoc.is_none() {
            a_eoc = Some(t);
        }
        if engine.channels()[1].engine().is_active() && b_start.is_none() {
            b_start = Some(t);
        }
    }
    let a_eoc = a_eoc.expect("A never finished");
    assert_eq!(b_start, Some(a_eoc + 1));
}

#[test]
fn queue_of_two_fires_twice_after_delay() {
    let config = ChannelConfig::new(DigitalInput::Tr1)
        .with(S::TriggerDelayMode, TriggerDelayMode::Queue as i32)
        .with(S::TriggerDelayCount, 2)
        .with(S::TriggerDelayMilliseconds, 100);
    let mut channel = EnvelopeChannel::with_engine(0, config, Recorder::default());
    let mut io = IoFrame::new();

    // Three edges inside one millisecond.
    for t in 0..3_000 {
        if t == 0 || t == 6 || t == 12 {
            io.trigger(DigitalInput::Tr1);
        }
        step(&mut channel, &mut io);
    }

    let fired = channel.engine().rising_ticks();
    assert_eq!(fired.len(), 2, "{fired:?}");
    // 100 ms is 1666.7 ticks
    assert_eq!(fired, vec![1_666, 1_672]);
}

#[test]
fn ring_keeps_the_newest_trigger() {
    let config = ChannelConfig::new(DigitalInput::Tr1)
        .with(S::TriggerDelayMode, TriggerDelayMode::Ring as i32)
        .with(S::TriggerDelayCount, 2)
        .with(S::TriggerDelayMilliseconds, 10);
    let mut channel = EnvelopeChannel::with_engine(0, config, Recorder::default());
    let mut io = IoFrame::new();

    for t in 0..1_000 {
        if t == 0 || t == 6 || t == 12 {
            io.trigger(DigitalInput::Tr1);
        }
        step(&mut channel, &mut io);
    }

    // The first request was soonest to fire and got replaced.
    let delay_ticks = (10_000u32).div_ceil(60) as usize - 1;
    assert_eq!(
        channel.engine().rising_ticks(),
        vec![6 + delay_ticks, 12 + delay_ticks]
    );
}

#[test]
fn euclidean_three_in_eight() {
    let config = ChannelConfig::new(DigitalInput::Tr1)
        .with(S::EuclideanLength, 8)
        .with(S::EuclideanFill, 3);
    let mut channel = EnvelopeChannel::with_engine(0, config, Recorder::default());
    let mut io = IoFrame::new();

    let mut passed = Vec::new();
    for _ in 0..16 {
        io.trigger(DigitalInput::Tr1);
        step(&mut channel, &mut io);
        let last = *channel.engine().gates.last().unwrap();
        if last.contains(GateState::RISING) {
            passed.push(channel.euclidean_counter() % 8);
        }
    }
    assert_eq!(passed, vec![3, 6, 0, 3, 6, 0]);
}

#[test]
fn euclidean_reset_on_fourth_edge() {
    let config = ChannelConfig::new(DigitalInput::Tr1)
        .with(S::EuclideanLength, 8)
        .with(S::EuclideanFill, 3)
        .with(S::EuclideanResetInput, 2)
        .with(S::EuclideanResetClockDiv, 4);
    let mut channel = EnvelopeChannel::with_engine(0, config, Recorder::default());
    let mut io = IoFrame::new();

    for _ in 0..5 {
        io.trigger(DigitalInput::Tr1);
        step(&mut channel, &mut io);
    }
    assert_eq!(channel.euclidean_counter(), 5);

    for edge in 1..=4 {
        io.trigger(DigitalInput::Tr2);
        step(&mut channel, &mut io);
        let expected = if edge < 4 { 5 } else { 0 };
        assert_eq!(channel.euclidean_counter(), expected, "edge {edge}");
    }
}

#[test]
fn outputs_stay_in_range_under_wild_cv() {
    let mut engine = QuadEngine::with_scaling(DacCalibration::new([0, 1_000, 32_768, 65_535]));
    let mappings = [
        CvMapping::Adr,
        CvMapping::Amplitude,
        CvMapping::EuclideanFill,
        CvMapping::MaxLoops,
    ];
    for (i, kind) in EnvelopeType::ALL.iter().take(4).enumerate() {
        let mut config = ChannelConfig::new(DigitalInput::ALL[i]).with(S::Type, *kind as i32);
        for (lane, m) in mappings.iter().enumerate() {
            config.apply_value(S::cv(lane).unwrap(), *m as i32);
        }
        engine.load(i, config).unwrap();
    }

    let mut io = IoFrame::new();
    let mut seed = 0x1234_5678u32;
    for t in 0..20_000 {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let cv = (seed >> 16) as i32 - 32_768;
        if t % 500 == 0 {
            for input in DigitalInput::ALL {
                io.set_gate(input, seed & input.mask() != 0);
            }
        }
        engine.process(&io, &[cv, -cv, cv / 3, 4_096]);
        io.clear_edges();

        for ch in engine.channels() {
            assert!(ch.sample() <= SAMPLE_MAX);
            let p = ch.params();
            assert!(p.euclidean_length <= 31);
            assert!(p.euclidean_fill <= 32 && p.euclidean_offset <= 32);
        }
        let out = engine.outputs();
        assert!(out.get(DacChannel::C) >= 32_768);
        assert_eq!(out.get(DacChannel::D), 65_535);
    }
}

#[test]
fn settings_survive_storage() {
    let config = adsr_patch(true).with(S::Cv3, CvMapping::DelayMs as i32);
    let stored = config.to_storage();
    let mut restored = ChannelConfig::default();
    restored.restore(&stored).unwrap();
    assert_eq!(restored, config);
}
