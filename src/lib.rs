//! Quad trigger-driven envelope generator core.
//!
//! Four envelope channels are updated once per control tick. Each channel
//! resolves its working parameters from stored settings and CV, filters
//! incoming triggers through a Euclidean pattern, optionally defers them
//! through a bounded delay table, and renders one sample through a curve
//! engine. Channels can trigger each other through an event bus that is
//! always one tick stale.
//!
//! Nothing on the tick path allocates or blocks.

pub mod engine; // Per-tick scheduling: resolver, delay table, bus, channels
pub mod envelope; // Curve engine seam and the multistage implementation
pub mod io; // Hardware-facing inputs and outputs
pub mod rhythm; // Euclidean gate filtering
pub mod settings; // Channel configuration and field table

pub use engine::{quad::QuadEngine, EnvelopeChannel};
pub use settings::{ChannelConfig, EnvelopeSetting};

/// Control ticks per second.
pub const CORE_ISR_FREQ: u32 = 16_666;
/// Length of one control tick in microseconds.
pub const TICK_PERIOD_US: u32 = 60;
/// Number of envelope channels driven by the coordinator.
pub const NUM_CHANNELS: usize = 4;
/// Largest sample a curve engine may render.
pub const SAMPLE_MAX: u16 = 32_767;
