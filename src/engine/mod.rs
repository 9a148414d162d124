// Purpose - per-tick scheduling: parameter resolution, trigger delays, event bus, channels

pub mod bus;
pub mod channel;
pub mod message;
pub mod quad;
pub mod resolver;
pub mod scheduler;

pub use self::{
    bus::{EventBus, InternalEvent},
    channel::EnvelopeChannel,
    message::{MessageReceiver, SettingsMessage},
    quad::QuadEngine,
    scheduler::{DelayOutcome, DelayedTrigger, TriggerDelayScheduler},
};
