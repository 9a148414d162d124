use crate::io::cv::{CvLanes, CvSampler};
use crate::io::output::{DacCalibration, DacChannel, OutputFrame, OutputScaling};
use crate::io::{DigitalInput, GateInputs};
use crate::settings::{ChannelConfig, SettingsError};
use crate::NUM_CHANNELS;

use super::bus::EventBus;
use super::channel::EnvelopeChannel;
use super::message::{MessageReceiver, SettingsMessage};

/// Drives the four channels once per control tick.
///
/// Channel `n` listens on hardware input `n` by default and writes DAC
/// output `n`.
#[derive(Debug, Clone)]
pub struct QuadEngine<S: OutputScaling = DacCalibration> {
    channels: [EnvelopeChannel; NUM_CHANNELS],
    cv: CvSampler,
    scaling: S,
    outputs: OutputFrame,
    bus: EventBus,
    ticks: u64,
}

impl Default for QuadEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadEngine {
    pub fn new() -> Self {
        Self::with_scaling(DacCalibration::default())
    }
}

impl<S: OutputScaling> QuadEngine<S> {
    pub fn with_scaling(scaling: S) -> Self {
        let channels = std::array::from_fn(|i| {
            EnvelopeChannel::new(i, ChannelConfig::new(DigitalInput::ALL[i]))
        });
        Self {
            channels,
            cv: CvSampler::new(),
            scaling,
            outputs: OutputFrame::default(),
            bus: EventBus::new(),
            ticks: 0,
        }
    }

    pub fn channel(&self, index: usize) -> Option<&EnvelopeChannel> {
        self.channels.get(index)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut EnvelopeChannel> {
        self.channels.get_mut(index)
    }

    pub fn channels(&self) -> &[EnvelopeChannel; NUM_CHANNELS] {
        &self.channels
    }

    /// Replace a channel's stored settings and restart its runtime state.
    pub fn load(&mut self, index: usize, config: ChannelConfig) -> Result<(), SettingsError> {
        let channel = self
            .channels
            .get_mut(index)
            .ok_or(SettingsError::UnknownChannel(index))?;
        *channel.config_mut() = config;
        channel.init();
        Ok(())
    }

    /// Apply one settings change. Returns whether the stored value changed.
    pub fn apply(&mut self, message: SettingsMessage) -> Result<bool, SettingsError> {
        let channel = self
            .channels
            .get_mut(message.channel)
            .ok_or(SettingsError::UnknownChannel(message.channel))?;
        Ok(channel.config_mut().apply_value(message.setting, message.value))
    }

    /// Drain pending settings changes. Call between ticks.
    pub fn apply_messages<R: MessageReceiver + ?Sized>(&mut self, receiver: &mut R) {
        while let Some(message) = receiver.pop() {
            match self.apply(message) {
                Ok(true) => log::debug!(
                    "channel {} {} = {}",
                    message.channel,
                    message.setting.attributes().name,
                    self.channels[message.channel].config().get(message.setting)
                ),
                Ok(false) => {}
                Err(err) => log::warn!("dropping {message:?}: {err}"),
            }
        }
    }

    /// Run one control tick.
    ///
    /// Channels run in order A to D. They all see the event bus captured
    /// from the previous tick.
    pub fn process<I: GateInputs + ?Sized>(&mut self, inputs: &I, raw_cvs: &CvLanes) -> &OutputFrame {
        let cvs = self.cv.push(raw_cvs);
        self.bus = EventBus::capture(&std::array::from_fn(|i| {
            self.channels[i].internal_events()
        }));

        for (channel, dac) in self.channels.iter_mut().zip(DacChannel::ALL) {
            channel.update(inputs, &self.bus, &cvs, dac, &self.scaling, &mut self.outputs);
        }
        self.ticks += 1;
        &self.outputs
    }

    pub fn outputs(&self) -> &OutputFrame {
        &self.outputs
    }

    /// Bus the channels read on the last tick.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn cv_values(&self) -> CvLanes {
        self.cv.values()
    }
}
