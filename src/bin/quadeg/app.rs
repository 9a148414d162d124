//! Simulator - preset loading and the engine thread

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use rtrb::{Consumer, Producer, RingBuffer};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use quad_envgen::{
    engine::SettingsMessage,
    io::{DigitalInput, IoFrame},
    ChannelConfig, QuadEngine, CORE_ISR_FREQ, NUM_CHANNELS,
};

use super::ui::{
    state::{GateMessage, ScopeFrame},
    UiApp,
};

/// Control ticks between two scope frames.
const SCOPE_DECIMATION: u32 = 64;
/// Engine thread wake-up period.
const ENGINE_SLICE: Duration = Duration::from_millis(2);

/// Main application builder
pub struct Simulator {
    configs: Vec<ChannelConfig>,
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            configs: DigitalInput::ALL.iter().map(|&i| ChannelConfig::new(i)).collect(),
        }
    }

    /// Load channel settings from a JSON preset file.
    pub fn preset(mut self, path: impl AsRef<Path>) -> EyreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read preset {}", path.display()))?;
        let configs: Vec<ChannelConfig> =
            serde_json::from_str(&text).wrap_err("preset is not a list of channel objects")?;
        if configs.len() > NUM_CHANNELS {
            return Err(eyre!(
                "preset has {} channels, at most {} are supported",
                configs.len(),
                NUM_CHANNELS
            ));
        }
        for (slot, config) in self.configs.iter_mut().zip(configs) {
            *slot = config;
        }
        Ok(self)
    }

    /// Run the engine thread and the terminal UI until the user quits.
    pub fn run(self) -> EyreResult<()> {
        let mut engine = QuadEngine::new();
        for (i, config) in self.configs.iter().enumerate() {
            engine.load(i, config.clone())?;
        }

        let (gate_tx, gate_rx) = RingBuffer::<GateMessage>::new(64);
        let (settings_tx, settings_rx) = RingBuffer::<SettingsMessage>::new(256);
        let (scope_tx, scope_rx) = RingBuffer::<ScopeFrame>::new(4096);
        let running = Arc::new(AtomicBool::new(true));

        let engine_running = running.clone();
        let handle = thread::Builder::new()
            .name("quadeg-engine".into())
            .spawn(move || {
                run_engine(engine, gate_rx, settings_rx, scope_tx, &engine_running);
            })
            .wrap_err("failed to spawn engine thread")?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(self.configs, gate_tx, settings_tx, scope_rx).run(&mut terminal);
        ratatui::restore();

        running.store(false, Ordering::Relaxed);
        handle
            .join()
            .map_err(|_| eyre!("engine thread panicked"))?;
        result
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Tick the engine in real time, feeding gates in and scope frames out.
fn run_engine(
    mut engine: QuadEngine,
    mut gate_rx: Consumer<GateMessage>,
    mut settings_rx: Consumer<SettingsMessage>,
    mut scope_tx: Producer<ScopeFrame>,
    running: &AtomicBool,
) {
    let start = Instant::now();
    let mut io = IoFrame::new();
    let mut done: u64 = 0;
    let mut since_frame = 0u32;

    while running.load(Ordering::Relaxed) {
        engine.apply_messages(&mut settings_rx);
        while let Ok(message) = gate_rx.pop() {
            match message {
                GateMessage::Gate { input, high } => io.set_gate(input, high),
                GateMessage::Trigger(input) => io.trigger(input),
            }
        }

        let due = start.elapsed().as_micros() as u64 * u64::from(CORE_ISR_FREQ) / 1_000_000;
        while done < due {
            engine.process(&io, &[0; 4]);
            io.clear_edges();
            done += 1;

            since_frame += 1;
            if since_frame >= SCOPE_DECIMATION {
                since_frame = 0;
                // A full scope buffer just means the UI is behind; skip the frame.
                let _ = scope_tx.push(ScopeFrame::capture(&engine, io.raised_mask()));
            }
        }

        thread::sleep(ENGINE_SLICE);
    }
}
