//! Enumerated setting values.

use crate::engine::bus::InternalEvent;
use crate::io::DigitalInput;
use crate::NUM_CHANNELS;

/// Envelope layouts. The `L` variants loop part of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnvelopeType {
    #[default]
    Ad,
    Adsr,
    Adr,
    Ar,
    Adsar,
    Adar,
    AdL2,
    AdrL3,
    AdL2R,
    AdaL2R,
    AdarL4,
}

impl EnvelopeType {
    pub const ALL: [EnvelopeType; 11] = [
        EnvelopeType::Ad,
        EnvelopeType::Adsr,
        EnvelopeType::Adr,
        EnvelopeType::Ar,
        EnvelopeType::Adsar,
        EnvelopeType::Adar,
        EnvelopeType::AdL2,
        EnvelopeType::AdrL3,
        EnvelopeType::AdL2R,
        EnvelopeType::AdaL2R,
        EnvelopeType::AdarL4,
    ];

    pub fn from_value(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            EnvelopeType::Ad => "AD",
            EnvelopeType::Adsr => "ADSR",
            EnvelopeType::Adr => "ADR",
            EnvelopeType::Ar => "AR",
            EnvelopeType::Adsar => "ADSAR",
            EnvelopeType::Adar => "ADAR",
            EnvelopeType::AdL2 => "ADL2",
            EnvelopeType::AdrL3 => "ADRL3",
            EnvelopeType::AdL2R => "ADL2R",
            EnvelopeType::AdaL2R => "ADAL2R",
            EnvelopeType::AdarL4 => "ADARL4",
        }
    }

    /// Segment values that shape this type (the rest are unused).
    pub fn editable_segments(self) -> usize {
        match self {
            EnvelopeType::Ad | EnvelopeType::Ar | EnvelopeType::AdL2 => 2,
            _ => 4,
        }
    }
}

/// Where a CV lane's contribution goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CvMapping {
    #[default]
    None,
    Seg1,
    Seg2,
    Seg3,
    Seg4,
    /// Segments 1, 2 and 4 together.
    Adr,
    EuclideanLength,
    EuclideanFill,
    EuclideanOffset,
    DelayMs,
    Amplitude,
    MaxLoops,
}

impl CvMapping {
    pub const ALL: [CvMapping; 12] = [
        CvMapping::None,
        CvMapping::Seg1,
        CvMapping::Seg2,
        CvMapping::Seg3,
        CvMapping::Seg4,
        CvMapping::Adr,
        CvMapping::EuclideanLength,
        CvMapping::EuclideanFill,
        CvMapping::EuclideanOffset,
        CvMapping::DelayMs,
        CvMapping::Amplitude,
        CvMapping::MaxLoops,
    ];

    pub fn from_value(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }
}

/// How triggers are deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerDelayMode {
    /// Fire immediately.
    #[default]
    Off,
    /// Defer into a free slot; drop when none is free.
    Queue,
    /// Defer into a free slot; overwrite the soonest pending one when full.
    Ring,
}

impl TriggerDelayMode {
    pub const ALL: [TriggerDelayMode; 3] = [
        TriggerDelayMode::Off,
        TriggerDelayMode::Queue,
        TriggerDelayMode::Ring,
    ];

    pub fn from_value(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }
}

/// Decoded trigger-input selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Hardware(DigitalInput),
    /// Another channel's internal event. `channel` is absolute and never the
    /// owning channel.
    Internal { channel: usize, event: InternalEvent },
}

/// Selector values below this pick a hardware input.
pub const HARDWARE_SOURCES: i32 = DigitalInput::COUNT as i32;

/// Largest stored selector value.
pub const MAX_TRIGGER_SOURCE: i32 =
    HARDWARE_SOURCES - 1 + (NUM_CHANNELS as i32 - 1) * InternalEvent::COUNT as i32;

impl TriggerSource {
    /// Decode a stored selector for the channel at `own_index`.
    ///
    /// Internal selectors store the other channel as an index that skips the
    /// owner, so a channel cannot select itself.
    pub fn decode(value: i32, own_index: usize) -> Self {
        if value < HARDWARE_SOURCES {
            let input = usize::try_from(value)
                .ok()
                .and_then(DigitalInput::from_index)
                .unwrap_or(DigitalInput::Tr1);
            return TriggerSource::Hardware(input);
        }

        let offset = (value - HARDWARE_SOURCES) as usize;
        let skip_self = (offset / InternalEvent::COUNT).min(NUM_CHANNELS - 2);
        let event = InternalEvent::from_index(offset % InternalEvent::COUNT);
        let channel = if skip_self < own_index {
            skip_self
        } else {
            skip_self + 1
        };
        TriggerSource::Internal { channel, event }
    }

    /// Stored selector for this source, `None` if it names `own_index` itself.
    pub fn encode(self, own_index: usize) -> Option<i32> {
        match self {
            TriggerSource::Hardware(input) => Some(input.index() as i32),
            TriggerSource::Internal { channel, event } => {
                if channel == own_index || channel >= NUM_CHANNELS {
                    return None;
                }
                let skip_self = if channel < own_index { channel } else { channel - 1 };
                Some(HARDWARE_SOURCES + (skip_self * InternalEvent::COUNT + event.index()) as i32)
            }
        }
    }
}
