// Purpose - hardware-facing interfaces: gate inputs, CV lanes, DAC outputs

pub mod cv;
pub mod output;

/// Hardware gate/trigger input jacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DigitalInput {
    Tr1,
    Tr2,
    Tr3,
    Tr4,
}

impl DigitalInput {
    pub const COUNT: usize = 4;
    pub const ALL: [DigitalInput; Self::COUNT] = [
        DigitalInput::Tr1,
        DigitalInput::Tr2,
        DigitalInput::Tr3,
        DigitalInput::Tr4,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit for this input in a rising-edge or raised mask.
    #[inline]
    pub fn mask(self) -> u32 {
        1 << self as u32
    }
}

/// Source of digital input state for one control tick.
pub trait GateInputs {
    /// Inputs that rose since the previous tick; bit `n` is input `n`.
    fn rising_edges(&self) -> u32;

    /// Whether `input` is held high right now.
    fn is_raised(&self, input: DigitalInput) -> bool;
}

/// Snapshot of the digital inputs for a control tick.
///
/// Rising edges are latched until [`IoFrame::clear_edges`] so that a gate
/// that goes high between two ticks is still seen exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoFrame {
    rising: u32,
    raised: u32,
}

impl IoFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new gate level. A low to high transition latches a rising edge.
    pub fn set_gate(&mut self, input: DigitalInput, high: bool) {
        let bit = input.mask();
        if high {
            if self.raised & bit == 0 {
                self.rising |= bit;
            }
            self.raised |= bit;
        } else {
            self.raised &= !bit;
        }
    }

    /// Latch a momentary trigger without changing the held level.
    pub fn trigger(&mut self, input: DigitalInput) {
        self.rising |= input.mask();
    }

    /// Forget edges once a tick has consumed them.
    pub fn clear_edges(&mut self) {
        self.rising = 0;
    }

    pub fn raised_mask(&self) -> u32 {
        self.raised
    }
}

impl GateInputs for IoFrame {
    fn rising_edges(&self) -> u32 {
        self.rising
    }

    fn is_raised(&self, input: DigitalInput) -> bool {
        self.raised & input.mask() != 0
    }
}
