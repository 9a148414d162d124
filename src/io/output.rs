//! DAC output scaling.

use crate::{NUM_CHANNELS, SAMPLE_MAX};

/// Largest code accepted by the output DAC.
pub const DAC_MAX_VALUE: u32 = 65_535;

/// Hardware output slots, one per envelope channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DacChannel {
    A,
    B,
    C,
    D,
}

impl DacChannel {
    pub const ALL: [DacChannel; NUM_CHANNELS] =
        [DacChannel::A, DacChannel::B, DacChannel::C, DacChannel::D];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Calibration data needed to place a unipolar sample on an output.
pub trait OutputScaling {
    /// DAC code that corresponds to 0V on `channel`.
    fn zero_offset(&self, channel: DacChannel) -> u32;

    fn max_value(&self) -> u32 {
        DAC_MAX_VALUE
    }
}

/// Fixed per-channel zero offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DacCalibration {
    zero_offsets: [u32; NUM_CHANNELS],
}

impl DacCalibration {
    pub fn new(zero_offsets: [u32; NUM_CHANNELS]) -> Self {
        Self {
            zero_offsets: zero_offsets.map(|o| o.min(DAC_MAX_VALUE)),
        }
    }
}

impl OutputScaling for DacCalibration {
    fn zero_offset(&self, channel: DacChannel) -> u32 {
        self.zero_offsets[channel.index()]
    }
}

/// Map `0..=32767` onto `offset..=max`.
#[inline]
pub fn scale_unipolar(sample: u16, offset: u32, max: u32) -> u32 {
    let sample = u64::from(sample.min(SAMPLE_MAX));
    let span = u64::from(max.saturating_sub(offset));
    offset.min(max) + (sample * span / u64::from(SAMPLE_MAX)) as u32
}

/// DAC codes written during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputFrame {
    values: [u32; NUM_CHANNELS],
}

impl OutputFrame {
    pub fn set(&mut self, channel: DacChannel, value: u32) {
        self.values[channel.index()] = value;
    }

    pub fn get(&self, channel: DacChannel) -> u32 {
        self.values[channel.index()]
    }

    pub fn values(&self) -> &[u32; NUM_CHANNELS] {
        &self.values
    }
}
