use crate::settings::{TriggerDelayMode, MAX_DELAYED_TRIGGERS};
use crate::TICK_PERIOD_US;

/// One deferred trigger. A free slot has both fields zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelayedTrigger {
    /// Requested delay in microseconds.
    pub delay: u32,
    /// Countdown in microseconds; pending while non-zero.
    pub time_left: u32,
}

impl DelayedTrigger {
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.time_left > 0
    }

    fn activate(&mut self, delay: u32) {
        self.delay = delay;
        self.time_left = delay;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What happened to a trigger handed to [`TriggerDelayScheduler::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    /// No delay applies; fire this tick.
    FireNow,
    /// Stored in a free slot.
    Scheduled(usize),
    /// Ring mode replaced the soonest pending trigger in this slot.
    Overwrote(usize),
    /// Queue mode had no free slot.
    Dropped,
}

/// Fixed table of deferred triggers for one channel.
#[derive(Debug, Clone)]
pub struct TriggerDelayScheduler {
    slots: [DelayedTrigger; MAX_DELAYED_TRIGGERS],
    next: Option<usize>,
}

impl Default for TriggerDelayScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerDelayScheduler {
    pub fn new() -> Self {
        Self {
            slots: [DelayedTrigger::default(); MAX_DELAYED_TRIGGERS],
            next: None,
        }
    }

    /// Defer a trigger by `delay_us`.
    ///
    /// Only the first `limit` slots take new requests. With `Off` or a zero
    /// delay the trigger is not stored at all.
    pub fn submit(&mut self, mode: TriggerDelayMode, limit: usize, delay_us: u32) -> DelayOutcome {
        if mode == TriggerDelayMode::Off || delay_us == 0 {
            return DelayOutcome::FireNow;
        }

        let limit = limit.clamp(1, MAX_DELAYED_TRIGGERS);
        if let Some(free) = self.slots[..limit].iter().position(|s| !s.is_pending()) {
            self.slots[free].activate(delay_us);
            self.refresh_next();
            return DelayOutcome::Scheduled(free);
        }

        match mode {
            TriggerDelayMode::Ring => {
                let victim = self.soonest(limit).unwrap_or(0);
                log::trace!(
                    "delay ring full, replacing slot {victim} ({} us left)",
                    self.slots[victim].time_left
                );
                self.slots[victim].activate(delay_us);
                self.refresh_next();
                DelayOutcome::Overwrote(victim)
            }
            _ => {
                log::trace!("delay queue full ({limit} slots), dropping trigger");
                DelayOutcome::Dropped
            }
        }
    }

    /// Count every pending slot down by one tick.
    ///
    /// Returns true if at least one slot fired; several slots firing on the
    /// same tick still count as a single trigger.
    pub fn tick(&mut self) -> bool {
        let mut fired = false;
        for slot in self.slots.iter_mut().filter(|s| s.is_pending()) {
            if slot.time_left > TICK_PERIOD_US {
                slot.time_left -= TICK_PERIOD_US;
            } else {
                slot.clear();
                fired = true;
            }
        }
        self.refresh_next();
        fired
    }

    /// The pending trigger that fires first.
    pub fn next_delayed_trigger(&self) -> Option<&DelayedTrigger> {
        self.next.map(|i| &self.slots[i])
    }

    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.is_pending()).count()
    }

    pub fn slots(&self) -> &[DelayedTrigger] {
        &self.slots
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(DelayedTrigger::clear);
        self.next = None;
    }

    /// Pending slot among the first `limit` with the least time left.
    fn soonest(&self, limit: usize) -> Option<usize> {
        self.slots[..limit.min(MAX_DELAYED_TRIGGERS)]
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_pending())
            .min_by_key(|(_, s)| s.time_left)
            .map(|(i, _)| i)
    }

    fn refresh_next(&mut self) {
        self.next = self.soonest(MAX_DELAYED_TRIGGERS);
    }
}
