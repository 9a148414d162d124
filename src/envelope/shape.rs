//! Segment curves and time scaling.
//!
//! Phases and curve outputs are 16-bit fractions: `0` is the start of a
//! segment, `0xFFFF` its end.

use super::{EnvelopeShape, MAX_TIME_MULTIPLIER};

/// Duration of the shortest segment, in control ticks (about 1 ms).
pub const MIN_SEGMENT_TICKS: u64 = 16;

/// Steps between doublings of the segment duration.
const STEPS_PER_OCTAVE: u64 = 16;

/// Apply `shape` to a segment phase.
#[inline]
pub fn apply(shape: EnvelopeShape, x: u16) -> u16 {
    let x = u64::from(x);
    let y = match shape {
        EnvelopeShape::Linear => x,
        EnvelopeShape::Exponential => {
            let inv = 0x1_0000 - x;
            0x1_0000 - ((inv * inv * inv) >> 32)
        }
        EnvelopeShape::Quartic => (x * x * x * x) >> 48,
        EnvelopeShape::Sine => {
            // cubic smoothstep, 3x^2 - 2x^3
            (3 * x * x * 0x1_0000 - 2 * x * x * x) >> 32
        }
        EnvelopeShape::Gate => {
            if x == 0xFFFF {
                0xFFFF
            } else {
                0
            }
        }
    };
    y.min(0xFFFF) as u16
}

/// Number of ticks a segment with this time value lasts.
///
/// The top byte of `time` picks a point on an exponential scale: every
/// sixteen steps double the duration, with linear steps in between.
pub fn segment_ticks(time: u16, multiplier: u8) -> u64 {
    let index = u64::from(time >> 8);
    let octave = index / STEPS_PER_OCTAVE;
    let frac = index % STEPS_PER_OCTAVE;
    let base = (MIN_SEGMENT_TICKS << octave) * (STEPS_PER_OCTAVE + frac) / STEPS_PER_OCTAVE;
    base << multiplier.min(MAX_TIME_MULTIPLIER)
}

/// Per-tick phase increment for a 32-bit phase accumulator.
#[inline]
pub fn phase_increment(time: u16, multiplier: u8) -> u32 {
    (u64::from(u32::MAX) / segment_ticks(time, multiplier)).max(1) as u32
}
