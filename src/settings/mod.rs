// Purpose - per-channel stored configuration: field table, bounds, typed access

pub mod types;

use thiserror::Error;

use crate::envelope::{EnvelopeShape, FallingGateBehaviour, ResetBehaviour, MAX_TIME_MULTIPLIER};
use crate::io::DigitalInput;

pub use types::{CvMapping, EnvelopeType, TriggerDelayMode, TriggerSource, MAX_TRIGGER_SOURCE};

/// Fixed capacity of the delayed-trigger table.
pub const MAX_DELAYED_TRIGGERS: usize = 24;

/// Errors from raw, index-based access to a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unknown setting index {0}")]
    UnknownField(usize),
    #[error("expected {expected} stored values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("unknown channel {0}")]
    UnknownChannel(usize),
}

/// Width of a field in persistent storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    U4,
    U8,
    U16,
}

impl StorageType {
    pub const fn bits(self) -> usize {
        match self {
            StorageType::U4 => 4,
            StorageType::U8 => 8,
            StorageType::U16 => 16,
        }
    }
}

/// Default, bounds and storage width of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueAttributes {
    pub default: i32,
    pub min: i32,
    pub max: i32,
    pub name: &'static str,
    pub storage: StorageType,
}

impl ValueAttributes {
    const fn new(default: i32, min: i32, max: i32, name: &'static str, storage: StorageType) -> Self {
        Self {
            default,
            min,
            max,
            name,
            storage,
        }
    }

    #[inline]
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

/// Every stored field, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeSetting {
    Type,
    Seg1Value,
    Seg2Value,
    Seg3Value,
    Seg4Value,
    TriggerInput,
    TriggerDelayMode,
    TriggerDelayCount,
    TriggerDelayMilliseconds,
    TriggerDelaySeconds,
    EuclideanLength,
    EuclideanFill,
    EuclideanOffset,
    EuclideanResetInput,
    EuclideanResetClockDiv,
    Cv1,
    Cv2,
    Cv3,
    Cv4,
    AttackResetBehaviour,
    AttackFallingGateBehaviour,
    DecayReleaseResetBehaviour,
    GateHigh,
    AttackShape,
    DecayShape,
    ReleaseShape,
    AttackTimeMultiplier,
    DecayTimeMultiplier,
    ReleaseTimeMultiplier,
    Amplitude,
    SampledAmplitude,
    MaxLoops,
    Inverted,
}

use EnvelopeSetting as S;
use StorageType::{U16, U4, U8};

static ATTRIBUTES: [ValueAttributes; EnvelopeSetting::COUNT] = [
    ValueAttributes::new(0, 0, EnvelopeType::ALL.len() as i32 - 1, "type", U8),
    ValueAttributes::new(128, 0, 255, "seg1", U16),
    ValueAttributes::new(128, 0, 255, "seg2", U16),
    ValueAttributes::new(128, 0, 255, "seg3", U16),
    ValueAttributes::new(128, 0, 255, "seg4", U16),
    ValueAttributes::new(0, 0, MAX_TRIGGER_SOURCE, "trigger_input", U4),
    ValueAttributes::new(0, 0, TriggerDelayMode::ALL.len() as i32 - 1, "delay_mode", U4),
    ValueAttributes::new(1, 1, MAX_DELAYED_TRIGGERS as i32, "delay_count", U8),
    ValueAttributes::new(0, 0, 999, "delay_ms", U16),
    ValueAttributes::new(0, 0, 64, "delay_s", U8),
    ValueAttributes::new(0, 0, 31, "euclidean_length", U8),
    ValueAttributes::new(1, 0, 32, "euclidean_fill", U8),
    ValueAttributes::new(0, 0, 32, "euclidean_offset", U8),
    ValueAttributes::new(0, 0, DigitalInput::COUNT as i32, "euclidean_reset_input", U8),
    ValueAttributes::new(1, 1, 255, "euclidean_reset_div", U8),
    ValueAttributes::new(0, 0, CvMapping::ALL.len() as i32 - 1, "cv1", U4),
    ValueAttributes::new(0, 0, CvMapping::ALL.len() as i32 - 1, "cv2", U4),
    ValueAttributes::new(0, 0, CvMapping::ALL.len() as i32 - 1, "cv3", U4),
    ValueAttributes::new(0, 0, CvMapping::ALL.len() as i32 - 1, "cv4", U4),
    ValueAttributes::new(0, 0, ResetBehaviour::ALL.len() as i32 - 1, "attack_reset", U4),
    ValueAttributes::new(0, 0, FallingGateBehaviour::ALL.len() as i32 - 1, "attack_falling_gate", U8),
    ValueAttributes::new(1, 0, ResetBehaviour::ALL.len() as i32 - 1, "decay_release_reset", U4),
    ValueAttributes::new(0, 0, 1, "gate_high", U4),
    ValueAttributes::new(2, 0, EnvelopeShape::ALL.len() as i32 - 1, "attack_shape", U4),
    ValueAttributes::new(1, 0, EnvelopeShape::ALL.len() as i32 - 1, "decay_shape", U4),
    ValueAttributes::new(1, 0, EnvelopeShape::ALL.len() as i32 - 1, "release_shape", U4),
    ValueAttributes::new(0, 0, MAX_TIME_MULTIPLIER as i32, "attack_multiplier", U4),
    ValueAttributes::new(0, 0, MAX_TIME_MULTIPLIER as i32, "decay_multiplier", U4),
    ValueAttributes::new(0, 0, MAX_TIME_MULTIPLIER as i32, "release_multiplier", U4),
    ValueAttributes::new(127, 0, 127, "amplitude", U8),
    ValueAttributes::new(0, 0, 1, "sampled_amplitude", U4),
    ValueAttributes::new(0, 0, 127, "max_loops", U8),
    ValueAttributes::new(0, 0, 1, "inverted", U8),
];

impl EnvelopeSetting {
    pub const COUNT: usize = 33;
    pub const ALL: [EnvelopeSetting; Self::COUNT] = [
        S::Type,
        S::Seg1Value,
        S::Seg2Value,
        S::Seg3Value,
        S::Seg4Value,
        S::TriggerInput,
        S::TriggerDelayMode,
        S::TriggerDelayCount,
        S::TriggerDelayMilliseconds,
        S::TriggerDelaySeconds,
        S::EuclideanLength,
        S::EuclideanFill,
        S::EuclideanOffset,
        S::EuclideanResetInput,
        S::EuclideanResetClockDiv,
        S::Cv1,
        S::Cv2,
        S::Cv3,
        S::Cv4,
        S::AttackResetBehaviour,
        S::AttackFallingGateBehaviour,
        S::DecayReleaseResetBehaviour,
        S::GateHigh,
        S::AttackShape,
        S::DecayShape,
        S::ReleaseShape,
        S::AttackTimeMultiplier,
        S::DecayTimeMultiplier,
        S::ReleaseTimeMultiplier,
        S::Amplitude,
        S::SampledAmplitude,
        S::MaxLoops,
        S::Inverted,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.attributes().name == name)
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn attributes(self) -> &'static ValueAttributes {
        &ATTRIBUTES[self.index()]
    }

    /// Segment value field `n` (0-based).
    pub fn segment(n: usize) -> Option<Self> {
        [S::Seg1Value, S::Seg2Value, S::Seg3Value, S::Seg4Value]
            .get(n)
            .copied()
    }

    /// CV mapping field `n` (0-based).
    pub fn cv(n: usize) -> Option<Self> {
        [S::Cv1, S::Cv2, S::Cv3, S::Cv4].get(n).copied()
    }
}

/// Stored configuration of one envelope channel.
///
/// Values are always inside their field bounds. Out-of-range writes clamp.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(
        into = "std::collections::BTreeMap<String, i32>",
        from = "std::collections::BTreeMap<String, i32>"
    )
)]
pub struct ChannelConfig {
    values: [i32; EnvelopeSetting::COUNT],
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new(DigitalInput::Tr1)
    }
}

impl ChannelConfig {
    /// Defaults, listening on `trigger` for gates.
    pub fn new(trigger: DigitalInput) -> Self {
        let mut values = [0; EnvelopeSetting::COUNT];
        for (value, attr) in values.iter_mut().zip(ATTRIBUTES.iter()) {
            *value = attr.default;
        }
        values[S::TriggerInput.index()] = trigger.index() as i32;
        Self { values }
    }

    /// Builder-style setter.
    pub fn with(mut self, setting: EnvelopeSetting, value: i32) -> Self {
        self.apply_value(setting, value);
        self
    }

    #[inline]
    pub fn get(&self, setting: EnvelopeSetting) -> i32 {
        self.values[setting.index()]
    }

    /// Store `value` clamped to the field bounds. Returns whether it changed.
    pub fn apply_value(&mut self, setting: EnvelopeSetting, value: i32) -> bool {
        let clamped = setting.attributes().clamp(value);
        let slot = &mut self.values[setting.index()];
        let changed = *slot != clamped;
        *slot = clamped;
        changed
    }

    /// Nudge a field by `delta`, clamping the result.
    pub fn change_value(&mut self, setting: EnvelopeSetting, delta: i32) -> bool {
        self.apply_value(setting, self.get(setting).saturating_add(delta))
    }

    pub fn get_by_index(&self, index: usize) -> Result<i32, SettingsError> {
        EnvelopeSetting::from_index(index)
            .map(|s| self.get(s))
            .ok_or(SettingsError::UnknownField(index))
    }

    pub fn set_by_index(&mut self, index: usize, value: i32) -> Result<bool, SettingsError> {
        let setting = EnvelopeSetting::from_index(index).ok_or(SettingsError::UnknownField(index))?;
        Ok(self.apply_value(setting, value))
    }

    /// Values in storage order. Every value fits its field width.
    pub fn to_storage(&self) -> [u16; EnvelopeSetting::COUNT] {
        let mut out = [0u16; EnvelopeSetting::COUNT];
        for (dst, &v) in out.iter_mut().zip(self.values.iter()) {
            *dst = v as u16;
        }
        out
    }

    /// Load values in storage order, clamping each one.
    pub fn restore(&mut self, stored: &[u16]) -> Result<(), SettingsError> {
        if stored.len() != EnvelopeSetting::COUNT {
            return Err(SettingsError::LengthMismatch {
                expected: EnvelopeSetting::COUNT,
                actual: stored.len(),
            });
        }
        for (setting, &raw) in EnvelopeSetting::ALL.iter().zip(stored) {
            self.apply_value(*setting, i32::from(raw));
        }
        log::debug!("restored channel config: {}", self.envelope_type().name());
        Ok(())
    }

    /// Total stored size of one configuration.
    pub fn storage_bits() -> usize {
        ATTRIBUTES.iter().map(|a| a.storage.bits()).sum()
    }

    pub fn envelope_type(&self) -> EnvelopeType {
        EnvelopeType::from_value(self.get(S::Type))
    }

    pub fn editable_segments(&self) -> usize {
        self.envelope_type().editable_segments()
    }

    /// Stored segment value `n` (0..=255).
    pub fn segment_value(&self, n: usize) -> i32 {
        EnvelopeSetting::segment(n).map_or(0, |s| self.get(s))
    }

    pub fn trigger_source(&self, own_index: usize) -> TriggerSource {
        TriggerSource::decode(self.get(S::TriggerInput), own_index)
    }

    pub fn delay_mode(&self) -> TriggerDelayMode {
        TriggerDelayMode::from_value(self.get(S::TriggerDelayMode))
    }

    pub fn delay_count(&self) -> usize {
        self.get(S::TriggerDelayCount) as usize
    }

    /// Configured delay in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        1000 * self.get(S::TriggerDelaySeconds) as u32
            + self.get(S::TriggerDelayMilliseconds) as u32
    }

    pub fn euclidean_length(&self) -> i32 {
        self.get(S::EuclideanLength)
    }

    pub fn euclidean_fill(&self) -> i32 {
        self.get(S::EuclideanFill)
    }

    pub fn euclidean_offset(&self) -> i32 {
        self.get(S::EuclideanOffset)
    }

    /// Input that re-aligns the Euclidean counter, if any.
    pub fn euclidean_reset_input(&self) -> Option<DigitalInput> {
        match self.get(S::EuclideanResetInput) {
            0 => None,
            v => DigitalInput::from_index(v as usize - 1),
        }
    }

    pub fn euclidean_reset_div(&self) -> u32 {
        self.get(S::EuclideanResetClockDiv) as u32
    }

    /// Mapping of CV lane `n` (0-based).
    pub fn cv_mapping(&self, n: usize) -> CvMapping {
        EnvelopeSetting::cv(n).map_or(CvMapping::None, |s| CvMapping::from_value(self.get(s)))
    }

    pub fn attack_reset(&self) -> ResetBehaviour {
        ResetBehaviour::from_value(self.get(S::AttackResetBehaviour))
    }

    pub fn attack_falling_gate(&self) -> FallingGateBehaviour {
        FallingGateBehaviour::from_value(self.get(S::AttackFallingGateBehaviour))
    }

    pub fn decay_release_reset(&self) -> ResetBehaviour {
        ResetBehaviour::from_value(self.get(S::DecayReleaseResetBehaviour))
    }

    pub fn gate_high(&self) -> bool {
        self.get(S::GateHigh) != 0
    }

    pub fn attack_shape(&self) -> EnvelopeShape {
        EnvelopeShape::from_value(self.get(S::AttackShape))
    }

    pub fn decay_shape(&self) -> EnvelopeShape {
        EnvelopeShape::from_value(self.get(S::DecayShape))
    }

    pub fn release_shape(&self) -> EnvelopeShape {
        EnvelopeShape::from_value(self.get(S::ReleaseShape))
    }

    pub fn attack_multiplier(&self) -> u8 {
        self.get(S::AttackTimeMultiplier) as u8
    }

    pub fn decay_multiplier(&self) -> u8 {
        self.get(S::DecayTimeMultiplier) as u8
    }

    pub fn release_multiplier(&self) -> u8 {
        self.get(S::ReleaseTimeMultiplier) as u8
    }

    /// Amplitude scaled to 16 bits.
    pub fn amplitude(&self) -> i32 {
        self.get(S::Amplitude) << 9
    }

    pub fn sampled_amplitude(&self) -> bool {
        self.get(S::SampledAmplitude) != 0
    }

    /// Loop limit scaled to 16 bits.
    pub fn max_loops(&self) -> i32 {
        self.get(S::MaxLoops) << 9
    }

    pub fn inverted(&self) -> bool {
        self.get(S::Inverted) != 0
    }
}

#[cfg(feature = "serde")]
impl From<ChannelConfig> for std::collections::BTreeMap<String, i32> {
    fn from(config: ChannelConfig) -> Self {
        EnvelopeSetting::ALL
            .iter()
            .map(|s| (s.attributes().name.to_string(), config.get(*s)))
            .collect()
    }
}

#[cfg(feature = "serde")]
impl From<std::collections::BTreeMap<String, i32>> for ChannelConfig {
    /// Missing fields keep their defaults; unknown names are skipped.
    fn from(map: std::collections::BTreeMap<String, i32>) -> Self {
        let mut config = ChannelConfig::default();
        for (name, value) in map {
            match EnvelopeSetting::from_name(&name) {
                Some(setting) => {
                    config.apply_value(setting, value);
                }
                None => log::warn!("ignoring unknown preset field {name:?}"),
            }
        }
        config
    }
}
