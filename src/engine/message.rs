#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::settings::EnvelopeSetting;

/// A settings change sent from a UI thread to the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SettingsMessage {
    pub channel: usize,
    pub setting: EnvelopeSetting,
    pub value: i32,
}

impl SettingsMessage {
    pub fn new(channel: usize, setting: EnvelopeSetting, value: i32) -> Self {
        Self {
            channel,
            setting,
            value,
        }
    }
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SettingsMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SettingsMessage> {
    fn pop(&mut self) -> Option<SettingsMessage> {
        Consumer::pop(self).ok()
    }
}

impl MessageReceiver for std::collections::VecDeque<SettingsMessage> {
    fn pop(&mut self) -> Option<SettingsMessage> {
        self.pop_front()
    }
}
