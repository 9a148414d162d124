use crate::envelope::EnvState;
use crate::NUM_CHANNELS;

/// Events a channel can publish for other channels to trigger on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InternalEvent {
    /// The envelope finished a cycle.
    EndOfCycle,
}

impl InternalEvent {
    pub const COUNT: usize = 1;
    pub const ALL: [InternalEvent; Self::COUNT] = [InternalEvent::EndOfCycle];

    /// Out-of-range indices map to the first event.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(InternalEvent::EndOfCycle)
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Engine state flag that raises this event.
    pub fn state_flag(self) -> EnvState {
        match self {
            InternalEvent::EndOfCycle => EnvState::EOC,
        }
    }
}

/// Snapshot of every channel's internal events.
///
/// The coordinator captures one bus per tick, before any channel runs, from
/// the events the channels left behind on the previous tick. Every channel
/// reads the same snapshot, so an event is seen one tick after it happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventBus {
    events: [[bool; InternalEvent::COUNT]; NUM_CHANNELS],
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from each channel's engine state.
    pub fn capture(states: &[EnvState; NUM_CHANNELS]) -> Self {
        let mut bus = Self::new();
        for (channel, state) in states.iter().enumerate() {
            for event in InternalEvent::ALL {
                bus.events[channel][event.index()] = state.contains(event.state_flag());
            }
        }
        bus
    }

    pub fn set(&mut self, channel: usize, event: InternalEvent, raised: bool) {
        if let Some(slot) = self.events.get_mut(channel) {
            slot[event.index()] = raised;
        }
    }

    /// Unknown channels read as not set.
    #[inline]
    pub fn is_set(&self, channel: usize, event: InternalEvent) -> bool {
        self.events
            .get(channel)
            .is_some_and(|slot| slot[event.index()])
    }

    pub fn any(&self) -> bool {
        self.events.iter().flatten().any(|&e| e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_maps_eoc_per_channel() {
        let states = [
            EnvState::empty(),
            EnvState::EOC,
            EnvState::empty(),
            EnvState::EOC,
        ];
        let bus = EventBus::capture(&states);
        let eoc = InternalEvent::EndOfCycle;
        assert!(!bus.is_set(0, eoc));
        assert!(bus.is_set(1, eoc));
        assert!(!bus.is_set(2, eoc));
        assert!(bus.is_set(3, eoc));
        assert!(!bus.is_set(7, eoc));
    }

    #[test]
    fn set_and_clear() {
        let mut bus = EventBus::new();
        assert!(!bus.any());
        bus.set(2, InternalEvent::EndOfCycle, true);
        assert!(bus.any());
        bus.set(2, InternalEvent::EndOfCycle, false);
        assert!(!bus.any());
        bus.set(9, InternalEvent::EndOfCycle, true);
        assert!(!bus.any());
    }
}
