use super::{
    shape, CurveEngine, CurveSettings, EnvState, EnvelopeShape, FallingGateBehaviour, GateState,
    LoopRegion, ResetBehaviour, ShapeFamily, PEAK_LEVEL,
};

/*
Multistage Envelope
===================

A fixed-point envelope made of up to four segments. Each segment ramps from
the level where the previous one ended towards its own target level, over a
duration taken from a 16-bit time value.

Vocabulary
----------

  level          Target value at a segment boundary (0 to 32767).
                 `levels[n]` is where segment `n` starts, `levels[n + 1]`
                 where it ends.

  phase          32-bit accumulator tracking progress through the current
                 segment. It wraps exactly once per segment; the wrap is what
                 moves the envelope on.

  sustain point  Segment index at which the envelope holds while the gate
                 is high. Zero means the layout never holds.

  loop region    Run of segments `[start, end)` that repeats when the end is
                 reached. Regions that stop short of the last segment only
                 repeat while the gate is held.

  EOC            End of cycle. Raised for the single tick on which the
                 envelope finishes, or wraps a loop covering every segment.


Layouts
-------

    AD      0 ─A→ peak ─D→ 0
    AR      0 ─A→ peak [hold] ─R→ 0
    ADSR    0 ─A→ peak ─D→ S [hold] ─R→ 0
    ADR     0 ─A→ peak ─D→ L ─R→ 0
    ADSAR   0 ─A→ peak ─D→ S [hold] ─A→ peak ─R→ 0
    ADAR    0 ─A→ peak ─D→ L ─A→ peak ─R→ 0


Gate Handling
-------------

A rising edge restarts the envelope. While the first attack is running the
attack reset behaviour decides how; afterwards the decay/release behaviour
does. An idle envelope always starts cleanly from zero.

A falling edge skips ahead to the sustain point (the release side of the
hold), or out of a gate-held loop. During the first attack this is subject to
the falling gate behaviour: `Ignore` lets the attack finish, after which the
envelope sees the gate is low and carries on without holding.
*/

/// Most segments any layout uses.
pub const MAX_SEGMENTS: usize = 4;

/// Which shape and time multiplier a segment borrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Attack,
    Decay,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    time: u16,
    kind: SegmentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    levels: [u16; MAX_SEGMENTS + 1],
    segments: [Segment; MAX_SEGMENTS],
    num_segments: usize,
    sustain_point: usize,
    looped: LoopRegion,
}

impl Layout {
    fn from_family(family: ShapeFamily) -> Self {
        use SegmentKind::{Attack, Decay, Release};

        match family {
            ShapeFamily::Ad {
                attack,
                decay,
                looped,
            } => Self::build(
                &[0, PEAK_LEVEL, 0],
                &[(attack, Attack), (decay, Decay)],
                0,
                looped,
            ),
            ShapeFamily::Ar { attack, release } => Self::build(
                &[0, PEAK_LEVEL, 0],
                &[(attack, Attack), (release, Release)],
                1,
                LoopRegion::NONE,
            ),
            ShapeFamily::Adsr {
                attack,
                decay,
                sustain,
                release,
            } => Self::build(
                &[0, PEAK_LEVEL, sustain, 0],
                &[(attack, Attack), (decay, Decay), (release, Release)],
                2,
                LoopRegion::NONE,
            ),
            ShapeFamily::Adr {
                attack,
                decay,
                level,
                release,
                looped,
            } => Self::build(
                &[0, PEAK_LEVEL, level, 0],
                &[(attack, Attack), (decay, Decay), (release, Release)],
                0,
                looped,
            ),
            ShapeFamily::Adsar {
                attack,
                decay,
                sustain,
                release,
            } => Self::build(
                &[0, PEAK_LEVEL, sustain, PEAK_LEVEL, 0],
                &[
                    (attack, Attack),
                    (decay, Decay),
                    (attack, Attack),
                    (release, Release),
                ],
                2,
                LoopRegion::NONE,
            ),
            ShapeFamily::Adar {
                attack,
                decay,
                level,
                release,
                looped,
            } => Self::build(
                &[0, PEAK_LEVEL, level, PEAK_LEVEL, 0],
                &[
                    (attack, Attack),
                    (decay, Decay),
                    (attack, Attack),
                    (release, Release),
                ],
                0,
                looped,
            ),
        }
    }

    fn build(
        levels: &[u16],
        segments: &[(u16, SegmentKind)],
        sustain_point: usize,
        looped: LoopRegion,
    ) -> Self {
        let num_segments = segments.len().min(MAX_SEGMENTS);
        let mut layout = Self {
            levels: [0; MAX_SEGMENTS + 1],
            segments: [Segment {
                time: 0,
                kind: SegmentKind::Attack,
            }; MAX_SEGMENTS],
            num_segments,
            sustain_point,
            looped: LoopRegion::new(looped.start, looped.end.min(num_segments as u8)),
        };
        for (dst, &level) in layout.levels.iter_mut().zip(levels) {
            *dst = level.min(PEAK_LEVEL);
        }
        for (dst, &(time, kind)) in layout.segments.iter_mut().zip(segments) {
            *dst = Segment { time, kind };
        }
        layout
    }

    /// Loop that covers the whole envelope, i.e. never waits for the gate.
    fn loops_whole_envelope(&self) -> bool {
        self.looped.is_active() && usize::from(self.looped.end) == self.num_segments
    }
}

#[derive(Debug, Clone)]
pub struct MultistageEnvelope {
    layout: Layout,
    settings: CurveSettings,

    amplitude: u16,
    amplitude_sampled: bool,
    sampled_amplitude: u16, // latched at the last retrigger
    max_loops: u16,

    // Runtime state (changes every tick)
    segment: usize, // == num_segments when idle
    phase: u32,
    start_value: u16,
    value: u16,
    loop_count: u16,
    state: EnvState,
}

impl MultistageEnvelope {
    pub fn new() -> Self {
        let layout = Layout::from_family(ShapeFamily::Ad {
            attack: 0,
            decay: 0,
            looped: LoopRegion::NONE,
        });
        Self {
            segment: layout.num_segments,
            layout,
            settings: CurveSettings::default(),
            amplitude: u16::MAX,
            amplitude_sampled: false,
            sampled_amplitude: 0,
            max_loops: 0,
            phase: 0,
            start_value: 0,
            value: 0,
            loop_count: 0,
            state: EnvState::empty(),
        }
    }

    /// Unscaled envelope level (before amplitude).
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Index of the running segment, `None` when idle.
    pub fn segment(&self) -> Option<usize> {
        (self.segment < self.layout.num_segments).then_some(self.segment)
    }

    pub fn is_active(&self) -> bool {
        self.segment < self.layout.num_segments
    }

    fn shape_for(&self, kind: SegmentKind) -> EnvelopeShape {
        match kind {
            SegmentKind::Attack => self.settings.attack_shape,
            SegmentKind::Decay => self.settings.decay_shape,
            SegmentKind::Release => self.settings.release_shape,
        }
    }

    fn multiplier_for(&self, kind: SegmentKind) -> u8 {
        match kind {
            SegmentKind::Attack => self.settings.attack_multiplier,
            SegmentKind::Decay => self.settings.decay_multiplier,
            SegmentKind::Release => self.settings.release_multiplier,
        }
    }

    fn loops_remaining(&self) -> bool {
        let max = self.max_loops >> 9;
        max == 0 || self.loop_count < max
    }

    fn jump_to(&mut self, segment: usize) {
        self.start_value = self.value;
        self.phase = 0;
        self.segment = segment;
    }

    fn retrigger(&mut self) {
        let behaviour = if !self.is_active() {
            ResetBehaviour::Hard
        } else if self.segment == 0 {
            self.settings.attack_reset
        } else {
            self.settings.decay_release_reset
        };

        match behaviour {
            ResetBehaviour::Ignore => return,
            ResetBehaviour::Hard => {
                self.start_value = self.layout.levels[0];
                self.value = self.start_value;
                self.phase = 0;
            }
            ResetBehaviour::SegmentPhase => {
                self.start_value = self.value;
                self.phase = 0;
            }
            ResetBehaviour::SegmentLevel => {
                let peak = self.layout.levels[1].max(1);
                let current = u64::from(self.value.min(peak));
                self.start_value = self.layout.levels[0];
                self.phase = ((current << 32) / u64::from(peak)).min(u64::from(u32::MAX)) as u32;
            }
        }

        self.segment = 0;
        self.loop_count = 0;
        if self.amplitude_sampled {
            self.sampled_amplitude = self.amplitude;
        }
    }

    fn release_gate(&mut self) {
        if !self.is_active() {
            return;
        }
        if self.segment == 0
            && self.settings.attack_falling_gate == FallingGateBehaviour::Ignore
        {
            return;
        }

        let layout = self.layout;
        if layout.sustain_point != 0 {
            if self.segment < layout.sustain_point {
                self.jump_to(layout.sustain_point);
            }
        } else if layout.looped.is_active() && !layout.loops_whole_envelope() {
            let end = usize::from(layout.looped.end);
            if self.segment < end {
                self.jump_to(end);
            }
        }
    }

    fn advance_segment(&mut self, gate_raised: bool) {
        let layout = self.layout;
        self.start_value = layout.levels[self.segment + 1];
        self.value = self.start_value;
        self.phase = 0;
        self.segment += 1;

        let looped = layout.looped;
        if looped.is_active()
            && self.segment == usize::from(looped.end)
            && self.loops_remaining()
            && (gate_raised || layout.loops_whole_envelope())
        {
            self.loop_count = self.loop_count.saturating_add(1);
            self.segment = usize::from(looped.start);
            if layout.loops_whole_envelope() {
                self.state |= EnvState::EOC;
            }
        }

        if self.segment >= layout.num_segments {
            self.segment = layout.num_segments;
            self.state |= EnvState::EOC;
        }
    }

    fn output(&self) -> u16 {
        let amplitude = if self.amplitude_sampled {
            self.sampled_amplitude
        } else {
            self.amplitude
        };
        ((u32::from(self.value) * u32::from(amplitude)) >> 16) as u16
    }
}

impl Default for MultistageEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn interpolate(from: u16, to: u16, curve: u16) -> u16 {
    let from = i64::from(from);
    let delta = i64::from(to) - from;
    (from + ((delta * i64::from(curve)) >> 16)) as u16
}

impl CurveEngine for MultistageEnvelope {
    fn set_family(&mut self, family: ShapeFamily) {
        let layout = Layout::from_family(family);
        if layout != self.layout {
            self.layout = layout;
            if self.segment > layout.num_segments {
                self.segment = layout.num_segments;
            }
        }
    }

    fn configure(&mut self, settings: &CurveSettings) {
        self.settings = *settings;
    }

    fn set_amplitude(&mut self, amplitude: u16, sampled: bool) {
        self.amplitude = amplitude;
        self.amplitude_sampled = sampled;
    }

    fn set_max_loops(&mut self, max_loops: u16) {
        self.max_loops = max_loops;
    }

    fn reset(&mut self) {
        self.segment = self.layout.num_segments;
        self.phase = 0;
        self.start_value = 0;
        self.value = 0;
        self.loop_count = 0;
        self.state = EnvState::empty();
    }

    fn render(&mut self, gate: GateState) -> u16 {
        self.state = EnvState::empty();

        if gate.contains(GateState::RISING) {
            self.retrigger();
        } else if gate.contains(GateState::FALLING) {
            self.release_gate();
        }

        if self.is_active() {
            let layout = self.layout;
            let raised = gate.contains(GateState::RAISED);
            let sustained = layout.sustain_point != 0 && self.segment == layout.sustain_point && raised;

            if sustained {
                self.value = self.start_value;
            } else {
                let segment = layout.segments[self.segment];
                let target = layout.levels[self.segment + 1];
                let curve = shape::apply(self.shape_for(segment.kind), (self.phase >> 16) as u16);
                self.value = interpolate(self.start_value, target, curve);

                let increment =
                    shape::phase_increment(segment.time, self.multiplier_for(segment.kind));
                match self.phase.checked_add(increment) {
                    Some(phase) => self.phase = phase,
                    None => self.advance_segment(raised),
                }
            }
        }

        debug_assert!(self.value <= PEAK_LEVEL);
        self.output()
    }

    fn state_mask(&self) -> EnvState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::shape::segment_ticks;

    const FAST: u16 = 0; // shortest segment
    const SLOW: u16 = 16 << 8; // twice the shortest

    fn run(env: &mut MultistageEnvelope, gate: GateState, ticks: usize) -> Vec<u16> {
        (0..ticks).map(|_| env.render(gate)).collect()
    }

    fn adsr(sustain: u16) -> ShapeFamily {
        ShapeFamily::Adsr {
            attack: FAST,
            decay: FAST,
            sustain,
            release: FAST,
        }
    }

    fn linear() -> CurveSettings {
        CurveSettings {
            attack_shape: EnvelopeShape::Linear,
            decay_shape: EnvelopeShape::Linear,
            release_shape: EnvelopeShape::Linear,
            ..CurveSettings::default()
        }
    }

    #[test]
    fn idle_envelope_renders_zero() {
        let mut env = MultistageEnvelope::new();
        assert!(run(&mut env, GateState::empty(), 50).iter().all(|&v| v == 0));
        assert!(!env.is_active());
    }

    #[test]
    fn ad_rises_to_peak_then_falls_and_flags_eoc_once() {
        let mut env = MultistageEnvelope::new();
        env.configure(&linear());
        env.set_family(ShapeFamily::Ad {
            attack: FAST,
            decay: FAST,
            looped: LoopRegion::NONE,
        });

        let ticks = segment_ticks(FAST, 0) as usize;
        let mut out = vec![env.render(GateState::RISING)];
        let mut eoc = 0;
        for _ in 0..ticks * 4 {
            out.push(env.render(GateState::empty()));
            if env.state_mask().contains(EnvState::EOC) {
                eoc += 1;
            }
        }

        let peak = *out.iter().max().unwrap();
        assert!(peak > 32_000, "attack should reach the peak, got {peak}");
        assert_eq!(*out.last().unwrap(), 0);
        assert_eq!(eoc, 1);
        assert!(!env.is_active());
    }

    #[test]
    fn adsr_holds_sustain_until_gate_falls() {
        let mut env = MultistageEnvelope::new();
        env.configure(&linear());
        env.set_family(adsr(12_000));

        env.render(GateState::RISING | GateState::RAISED);
        let held = run(&mut env, GateState::RAISED, 500);
        assert_eq!(u32::from(*held.last().unwrap()), (12_000 * u32::from(u16::MAX)) >> 16);
        assert_eq!(env.segment(), Some(2));

        env.render(GateState::FALLING);
        let released = run(&mut env, GateState::empty(), 100);
        assert_eq!(*released.last().unwrap(), 0);
    }

    #[test]
    fn falling_gate_during_attack_respects_behaviour() {
        let family = ShapeFamily::Ar {
            attack: SLOW,
            release: FAST,
        };

        let mut ignore = MultistageEnvelope::new();
        ignore.configure(&linear());
        ignore.set_family(family);
        ignore.render(GateState::RISING | GateState::RAISED);
        ignore.render(GateState::FALLING);
        assert_eq!(ignore.segment(), Some(0), "ignored fall keeps attacking");

        let mut honor = MultistageEnvelope::new();
        honor.configure(&CurveSettings {
            attack_falling_gate: FallingGateBehaviour::Honor,
            ..linear()
        });
        honor.set_family(family);
        honor.render(GateState::RISING | GateState::RAISED);
        honor.render(GateState::FALLING);
        assert_eq!(honor.segment(), Some(1), "honored fall goes to release");
    }

    #[test]
    fn ignore_reset_keeps_running_attack() {
        let mut env = MultistageEnvelope::new();
        env.configure(&CurveSettings {
            attack_reset: ResetBehaviour::Ignore,
            ..linear()
        });
        env.set_family(ShapeFamily::Ar {
            attack: SLOW,
            release: FAST,
        });

        env.render(GateState::RISING | GateState::RAISED);
        let before = run(&mut env, GateState::RAISED, 10);
        let after = env.render(GateState::RISING | GateState::RAISED);
        assert!(after > *before.last().unwrap());
    }

    #[test]
    fn hard_reset_restarts_from_zero() {
        let mut env = MultistageEnvelope::new();
        env.configure(&linear());
        env.set_family(ShapeFamily::Ar {
            attack: SLOW,
            release: FAST,
        });

        env.render(GateState::RISING | GateState::RAISED);
        run(&mut env, GateState::RAISED, 20);
        assert!(env.value() > 0);
        assert_eq!(env.render(GateState::RISING | GateState::RAISED), 0);
    }

    #[test]
    fn whole_envelope_loop_stops_after_max_loops() {
        let mut env = MultistageEnvelope::new();
        env.configure(&linear());
        env.set_family(ShapeFamily::Ad {
            attack: FAST,
            decay: FAST,
            looped: LoopRegion::new(0, 2),
        });
        env.set_max_loops(2 << 9);

        env.render(GateState::RISING);
        let mut eoc = 0;
        for _ in 0..1_000 {
            env.render(GateState::empty());
            if env.state_mask().contains(EnvState::EOC) {
                eoc += 1;
            }
        }
        // Two wraps plus the final end of cycle.
        assert_eq!(eoc, 3);
        assert!(!env.is_active());
    }

    #[test]
    fn gate_held_loop_exits_on_release() {
        let mut env = MultistageEnvelope::new();
        env.configure(&CurveSettings {
            attack_falling_gate: FallingGateBehaviour::Honor,
            ..linear()
        });
        env.set_family(ShapeFamily::Adr {
            attack: FAST,
            decay: FAST,
            level: 10_000,
            release: FAST,
            looped: LoopRegion::new(0, 2),
        });

        env.render(GateState::RISING | GateState::RAISED);
        run(&mut env, GateState::RAISED, 400);
        assert!(env.is_active(), "loop keeps running while the gate is held");

        env.render(GateState::FALLING);
        assert_eq!(env.segment(), Some(2));
        run(&mut env, GateState::empty(), 100);
        assert!(!env.is_active());
    }

    #[test]
    fn sampled_amplitude_is_latched_on_trigger() {
        let mut env = MultistageEnvelope::new();
        env.configure(&linear());
        env.set_family(ShapeFamily::Ar {
            attack: FAST,
            release: FAST,
        });
        env.set_amplitude(u16::MAX / 2 + 1, true);

        env.render(GateState::RISING | GateState::RAISED);
        run(&mut env, GateState::RAISED, 100);
        env.set_amplitude(u16::MAX, true);
        let held = env.render(GateState::RAISED);
        assert_eq!(held, PEAK_LEVEL / 2);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut env = MultistageEnvelope::new();
        env.set_family(adsr(20_000));
        env.render(GateState::RISING | GateState::RAISED);
        run(&mut env, GateState::RAISED, 5);
        env.reset();
        assert!(!env.is_active());
        assert_eq!(env.render(GateState::RAISED), 0);
    }
}
