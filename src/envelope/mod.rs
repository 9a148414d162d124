//! Envelope curve engine.
//!
//! The engine owns the attack/decay/sustain/release phase state. Channels
//! talk to it only through [`CurveEngine`]: they pick a segment layout,
//! forward behaviour settings, and ask for one sample per tick.

/// Fixed-point multistage envelope implementing [`CurveEngine`].
pub mod multistage;
/// Segment curve shapes and time scaling.
pub mod shape;

use bitflags::bitflags;

pub use multistage::MultistageEnvelope;

/// Level at the top of an attack segment.
pub const PEAK_LEVEL: u16 = crate::SAMPLE_MAX;

/// Largest time multiplier index (duration scaled by `2^13`).
pub const MAX_TIME_MULTIPLIER: u8 = 13;

bitflags! {
    /// Gate flags composed by a channel for one tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GateState: u8 {
        /// Gate is held (or forced high).
        const RAISED = 1 << 0;
        /// Accepted trigger edge this tick.
        const RISING = 1 << 1;
        /// Gate was held last tick and is released now.
        const FALLING = 1 << 2;
    }
}

bitflags! {
    /// Internal state bits reported by the engine after rendering.
    ///
    /// Bit positions line up with [`crate::engine::bus::InternalEvent`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EnvState: u8 {
        /// A full envelope cycle ended on this tick.
        const EOC = 1 << 0;
    }
}

/// What a retrigger does to an envelope that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResetBehaviour {
    /// Restart the attack from zero.
    #[default]
    Hard,
    /// Restart the attack from the current level.
    SegmentPhase,
    /// Jump to the point of the attack ramp that matches the current level.
    SegmentLevel,
    /// Ignore the trigger.
    Ignore,
}

impl ResetBehaviour {
    pub const ALL: [ResetBehaviour; 4] = [
        ResetBehaviour::Hard,
        ResetBehaviour::SegmentPhase,
        ResetBehaviour::SegmentLevel,
        ResetBehaviour::Ignore,
    ];

    pub fn from_value(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }
}

/// What a falling gate does while the first attack is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FallingGateBehaviour {
    /// Let the attack finish.
    #[default]
    Ignore,
    /// Abandon the attack and release from the current level.
    Honor,
}

impl FallingGateBehaviour {
    pub const ALL: [FallingGateBehaviour; 2] =
        [FallingGateBehaviour::Ignore, FallingGateBehaviour::Honor];

    pub fn from_value(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }
}

/// Curve followed inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnvelopeShape {
    #[default]
    Linear,
    /// Fast start, slow settle.
    Exponential,
    /// Slow start, fast finish.
    Quartic,
    /// Eased at both ends.
    Sine,
    /// Hold the start level, jump at the end.
    Gate,
}

impl EnvelopeShape {
    pub const ALL: [EnvelopeShape; 5] = [
        EnvelopeShape::Linear,
        EnvelopeShape::Exponential,
        EnvelopeShape::Quartic,
        EnvelopeShape::Sine,
        EnvelopeShape::Gate,
    ];

    pub fn from_value(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }
}

/// A run of segments `[start, end)` that repeats. `end == 0` disables looping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopRegion {
    pub start: u8,
    pub end: u8,
}

impl LoopRegion {
    pub const NONE: LoopRegion = LoopRegion { start: 0, end: 0 };

    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    pub fn is_active(&self) -> bool {
        self.end > self.start
    }
}

/// Segment layout handed to the engine every tick.
///
/// Durations and levels are 16-bit values. The `looped` region is what the
/// L-suffixed envelope types add on top of the plain layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeFamily {
    /// Attack, decay. No hold.
    Ad {
        attack: u16,
        decay: u16,
        looped: LoopRegion,
    },
    /// Attack, hold at peak while the gate is high, release.
    Ar { attack: u16, release: u16 },
    /// Attack, decay, hold at `sustain` while the gate is high, release.
    Adsr {
        attack: u16,
        decay: u16,
        sustain: u16,
        release: u16,
    },
    /// Attack, decay to `level`, release. No hold.
    Adr {
        attack: u16,
        decay: u16,
        level: u16,
        release: u16,
        looped: LoopRegion,
    },
    /// Like ADSR, but the release first climbs back to the peak.
    Adsar {
        attack: u16,
        decay: u16,
        sustain: u16,
        release: u16,
    },
    /// Attack, decay to `level`, attack again, release. No hold.
    Adar {
        attack: u16,
        decay: u16,
        level: u16,
        release: u16,
        looped: LoopRegion,
    },
}

/// Behaviour settings forwarded to the engine every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurveSettings {
    pub attack_reset: ResetBehaviour,
    pub attack_falling_gate: FallingGateBehaviour,
    pub decay_release_reset: ResetBehaviour,
    pub attack_shape: EnvelopeShape,
    pub decay_shape: EnvelopeShape,
    pub release_shape: EnvelopeShape,
    pub attack_multiplier: u8,
    pub decay_multiplier: u8,
    pub release_multiplier: u8,
}

/// The renderer a channel drives once per tick.
pub trait CurveEngine {
    /// Select the segment layout. Called every tick with live values.
    fn set_family(&mut self, family: ShapeFamily);

    fn configure(&mut self, settings: &CurveSettings);

    /// `sampled` latches the amplitude at each retrigger instead of tracking it.
    fn set_amplitude(&mut self, amplitude: u16, sampled: bool);

    fn set_max_loops(&mut self, max_loops: u16);

    /// Drop back to idle at zero.
    fn reset(&mut self);

    /// Advance one tick and return a sample in `0..=32767`.
    fn render(&mut self, gate: GateState) -> u16;

    /// State bits produced by the most recent [`CurveEngine::render`].
    fn state_mask(&self) -> EnvState;
}
