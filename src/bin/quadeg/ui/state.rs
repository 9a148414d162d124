//! Messages between the UI thread and the engine thread
//!
//! Everything here is `Copy` so it can cross an `rtrb` ring buffer without
//! allocating on the engine side.

use quad_envgen::{io::DigitalInput, QuadEngine, NUM_CHANNELS};

/// Gate changes sent from the UI thread to the engine thread
#[derive(Clone, Copy, Debug)]
pub enum GateMessage {
    /// Hold or release a gate input
    Gate { input: DigitalInput, high: bool },
    /// Momentary trigger
    Trigger(DigitalInput),
}

/// Per-channel snapshot for the scope (Copy, no allocations)
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelSnapshot {
    /// Rendered sample, 0 to 32767
    pub sample: u16,
    /// DAC code written for this tick
    pub dac: u32,
    /// Trigger indicator, 0 to 15
    pub activity: u8,
    /// Delayed triggers waiting to fire
    pub pending: u8,
    /// Remaining time of the next delayed trigger, in microseconds
    pub next_delay_us: u32,
    pub euclidean_counter: u32,
}

/// Engine state captured every few control ticks
#[derive(Clone, Copy, Debug, Default)]
pub struct ScopeFrame {
    /// Control ticks since start
    pub tick: u64,
    /// Held gate inputs, bit n is input n
    pub gates: u32,
    pub channels: [ChannelSnapshot; NUM_CHANNELS],
}

impl ScopeFrame {
    pub fn capture(engine: &QuadEngine, gates: u32) -> Self {
        let mut channels = [ChannelSnapshot::default(); NUM_CHANNELS];
        for (snap, ch) in channels.iter_mut().zip(engine.channels()) {
            *snap = ChannelSnapshot {
                sample: ch.sample(),
                dac: engine.outputs().values()[ch.index()],
                activity: ch.trigger_activity(),
                pending: ch.pending_delays() as u8,
                next_delay_us: ch.next_delayed_trigger().map_or(0, |t| t.time_left),
                euclidean_counter: ch.euclidean_counter(),
            };
        }
        Self {
            tick: engine.ticks(),
            gates,
            channels,
        }
    }
}
