use crate::envelope::{
    CurveEngine, CurveSettings, EnvState, GateState, LoopRegion, MultistageEnvelope, ShapeFamily,
};
use crate::io::cv::CvLanes;
use crate::io::output::{scale_unipolar, DacChannel, OutputFrame, OutputScaling};
use crate::io::GateInputs;
use crate::rhythm::EuclideanState;
use crate::settings::{ChannelConfig, EnvelopeType, TriggerSource};
use crate::{CORE_ISR_FREQ, SAMPLE_MAX};

use super::bus::EventBus;
use super::resolver::{resolve, ResolvedParams};
use super::scheduler::{DelayOutcome, DelayedTrigger, TriggerDelayScheduler};

/// Ticks for the activity indicator to fade out (1/8 s).
pub const ACTIVITY_DECAY_TICKS: u32 = CORE_ISR_FREQ / 8;

/// Decaying 4-bit trigger indicator for front-panel display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerActivity {
    remaining: u32,
}

impl TriggerActivity {
    pub fn update(&mut self, ticks: u32, active: bool) {
        if active {
            self.remaining = ACTIVITY_DECAY_TICKS;
        } else {
            self.remaining = self.remaining.saturating_sub(ticks);
        }
    }

    /// Brightness in `0..=15`.
    pub fn level(&self) -> u8 {
        (self.remaining * 15).div_ceil(ACTIVITY_DECAY_TICKS) as u8
    }
}

/// Segment layout for `kind` built from resolved segment values.
///
/// Layouts with a level third segment get it halved, so the 16-bit value
/// lands in the engine's 15-bit level range.
pub fn shape_family(kind: EnvelopeType, s: &[u16; 4]) -> ShapeFamily {
    let [s1, s2, s3, s4] = *s;
    let level = s3 >> 1;
    match kind {
        EnvelopeType::Ad => ShapeFamily::Ad {
            attack: s1,
            decay: s2,
            looped: LoopRegion::NONE,
        },
        EnvelopeType::Adsr => ShapeFamily::Adsr {
            attack: s1,
            decay: s2,
            sustain: level,
            release: s4,
        },
        EnvelopeType::Adr => ShapeFamily::Adr {
            attack: s1,
            decay: s2,
            level,
            release: s4,
            looped: LoopRegion::NONE,
        },
        EnvelopeType::Ar => ShapeFamily::Ar {
            attack: s1,
            release: s2,
        },
        EnvelopeType::Adsar => ShapeFamily::Adsar {
            attack: s1,
            decay: s2,
            sustain: level,
            release: s4,
        },
        EnvelopeType::Adar => ShapeFamily::Adar {
            attack: s1,
            decay: s2,
            level,
            release: s4,
            looped: LoopRegion::NONE,
        },
        EnvelopeType::AdL2 => ShapeFamily::Ad {
            attack: s1,
            decay: s2,
            looped: LoopRegion::new(0, 2),
        },
        EnvelopeType::AdrL3 => ShapeFamily::Adr {
            attack: s1,
            decay: s2,
            level,
            release: s4,
            looped: LoopRegion::new(0, 3),
        },
        EnvelopeType::AdL2R => ShapeFamily::Adr {
            attack: s1,
            decay: s2,
            level,
            release: s4,
            looped: LoopRegion::new(0, 2),
        },
        EnvelopeType::AdaL2R => ShapeFamily::Adar {
            attack: s1,
            decay: s2,
            level,
            release: s4,
            looped: LoopRegion::new(1, 3),
        },
        EnvelopeType::AdarL4 => ShapeFamily::Adar {
            attack: s1,
            decay: s2,
            level,
            release: s4,
            looped: LoopRegion::new(0, 4),
        },
    }
}

/// One envelope channel: settings, trigger handling and a curve engine.
#[derive(Debug, Clone)]
pub struct EnvelopeChannel<E: CurveEngine = MultistageEnvelope> {
    index: usize,
    config: ChannelConfig,
    engine: E,
    last_type: Option<EnvelopeType>,
    gate_raised: bool,
    euclidean: EuclideanState,
    delays: TriggerDelayScheduler,
    activity: TriggerActivity,
    params: ResolvedParams,
    events: EnvState,
    sample: u16,
}

impl EnvelopeChannel<MultistageEnvelope> {
    pub fn new(index: usize, config: ChannelConfig) -> Self {
        Self::with_engine(index, config, MultistageEnvelope::new())
    }
}

impl<E: CurveEngine> EnvelopeChannel<E> {
    pub fn with_engine(index: usize, config: ChannelConfig, engine: E) -> Self {
        let mut channel = Self {
            index,
            config,
            engine,
            last_type: None,
            gate_raised: false,
            euclidean: EuclideanState::new(),
            delays: TriggerDelayScheduler::new(),
            activity: TriggerActivity::default(),
            params: ResolvedParams::default(),
            events: EnvState::empty(),
            sample: 0,
        };
        channel.init();
        channel
    }

    /// Clear all runtime state. The stored configuration is kept.
    pub fn init(&mut self) {
        self.engine.reset();
        self.last_type = None;
        self.gate_raised = false;
        self.euclidean = EuclideanState::new();
        self.delays.clear();
        self.activity = TriggerActivity::default();
        self.events = EnvState::empty();
        self.sample = 0;
        log::debug!(
            "channel {} init: {} on {:?}",
            self.index,
            self.config.envelope_type().name(),
            self.config.trigger_source(self.index)
        );
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ChannelConfig {
        &mut self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Envelope type rendered on the last tick.
    pub fn last_type(&self) -> Option<EnvelopeType> {
        self.last_type
    }

    pub fn gate_raised(&self) -> bool {
        self.gate_raised
    }

    /// Parameters resolved on the last tick.
    pub fn params(&self) -> &ResolvedParams {
        &self.params
    }

    /// Raw sample (`0..=32767`, after inversion) from the last tick.
    pub fn sample(&self) -> u16 {
        self.sample
    }

    /// Engine state captured at the end of the last tick.
    pub fn internal_events(&self) -> EnvState {
        self.events
    }

    pub fn euclidean_counter(&self) -> u32 {
        self.euclidean.counter()
    }

    pub fn trigger_activity(&self) -> u8 {
        self.activity.level()
    }

    pub fn next_delayed_trigger(&self) -> Option<&DelayedTrigger> {
        self.delays.next_delayed_trigger()
    }

    pub fn pending_delays(&self) -> usize {
        self.delays.pending()
    }

    /// Run one control tick and write the scaled sample to `dac`.
    pub fn update<I, S>(
        &mut self,
        inputs: &I,
        bus: &EventBus,
        cvs: &CvLanes,
        dac: DacChannel,
        scaling: &S,
        out: &mut OutputFrame,
    ) where
        I: GateInputs + ?Sized,
        S: OutputScaling + ?Sized,
    {
        let config = &self.config;
        let params = resolve(config, cvs);
        self.params = params;

        let kind = config.envelope_type();
        self.engine.set_family(shape_family(kind, &params.segments));
        self.engine.set_amplitude(params.amplitude, config.sampled_amplitude());

        if self.last_type != Some(kind) {
            self.last_type = Some(kind);
            self.engine.reset();
        }

        self.engine.configure(&CurveSettings {
            attack_reset: config.attack_reset(),
            attack_falling_gate: config.attack_falling_gate(),
            decay_release_reset: config.decay_release_reset(),
            attack_shape: config.attack_shape(),
            decay_shape: config.decay_shape(),
            release_shape: config.release_shape(),
            attack_multiplier: config.attack_multiplier(),
            decay_multiplier: config.decay_multiplier(),
            release_multiplier: config.release_multiplier(),
        });
        self.engine.set_max_loops(params.max_loops);

        let rising = inputs.rising_edges();
        let (mut triggered, gate_raised) = match config.trigger_source(self.index) {
            TriggerSource::Hardware(input) => {
                (rising & input.mask() != 0, inputs.is_raised(input))
            }
            TriggerSource::Internal { channel, event } => {
                let fired = bus.is_set(channel, event);
                (fired, fired)
            }
        };

        self.activity.update(1, triggered || self.gate_raised);

        if triggered {
            self.euclidean.advance();
        }
        if let Some(reset) = config.euclidean_reset_input() {
            if rising & reset.mask() != 0 {
                self.euclidean.reset_edge(config.euclidean_reset_div());
            }
        }
        // A stored length of 0 turns the filter off; CV only reshapes an
        // enabled pattern.
        if triggered
            && config.euclidean_length() != 0
            && !self.euclidean.accepts(
                params.euclidean_length,
                params.euclidean_fill,
                params.euclidean_offset,
            )
        {
            triggered = false;
        }

        if triggered {
            let delay_us = u32::from(params.delay_ms) * 1000;
            triggered = matches!(
                self.delays
                    .submit(config.delay_mode(), config.delay_count(), delay_us),
                DelayOutcome::FireNow
            );
        }
        if self.delays.tick() {
            triggered = true;
        }

        let mut gate = GateState::empty();
        if triggered {
            gate |= GateState::RISING;
        }
        if gate_raised || config.gate_high() {
            gate |= GateState::RAISED;
        } else if self.gate_raised {
            gate |= GateState::FALLING;
        }
        self.gate_raised = gate_raised;

        let mut value = self.engine.render(gate).min(SAMPLE_MAX);
        if config.inverted() {
            value = SAMPLE_MAX - value;
        }
        self.sample = value;

        let offset = scaling.zero_offset(dac);
        out.set(dac, scale_unipolar(value, offset, scaling.max_value()));

        self.events = self.engine.state_mask();
    }
}
