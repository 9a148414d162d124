//! TUI module for quadeg
//!
//! Shows a scope per channel and lets the user hold gates and edit settings.

mod panel;
mod scope;
pub mod state;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::collections::VecDeque;
use std::time::Duration;

use quad_envgen::{
    engine::SettingsMessage, io::DigitalInput, ChannelConfig, EnvelopeSetting, NUM_CHANNELS,
};

use panel::{render_settings, render_status};
use scope::render_scope;
use state::{GateMessage, ScopeFrame};

/// Scope history length per channel, in frames
const SCOPE_HISTORY: usize = 512;

/// UI application state
pub struct UiApp {
    /// Local copy of each channel's settings, kept in step with the engine
    configs: Vec<ChannelConfig>,
    gate_tx: Producer<GateMessage>,
    settings_tx: Producer<SettingsMessage>,
    scope_rx: Consumer<ScopeFrame>,
    history: [VecDeque<u16>; NUM_CHANNELS],
    latest: ScopeFrame,
    held: [bool; DigitalInput::COUNT],
    channel: usize,
    cursor: usize,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        configs: Vec<ChannelConfig>,
        gate_tx: Producer<GateMessage>,
        settings_tx: Producer<SettingsMessage>,
        scope_rx: Consumer<ScopeFrame>,
    ) -> Self {
        Self {
            configs,
            gate_tx,
            settings_tx,
            scope_rx,
            history: std::array::from_fn(|_| VecDeque::from(vec![0; SCOPE_HISTORY])),
            latest: ScopeFrame::default(),
            held: [false; DigitalInput::COUNT],
            channel: 0,
            cursor: 0,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();

            terminal.draw(|frame| self.render(frame))?;

            // Non-blocking, ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn poll_scope(&mut self) {
        while let Ok(frame) = self.scope_rx.pop() {
            for (trace, ch) in self.history.iter_mut().zip(frame.channels.iter()) {
                trace.push_back(ch.sample);
                if trace.len() > SCOPE_HISTORY {
                    trace.pop_front();
                }
            }
            self.latest = frame;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                if let Some(input) = DigitalInput::from_index(index) {
                    self.held[index] = !self.held[index];
                    let _ = self.gate_tx.push(GateMessage::Gate {
                        input,
                        high: self.held[index],
                    });
                }
            }
            KeyCode::Char('t') => {
                if let Some(input) = DigitalInput::from_index(self.channel) {
                    let _ = self.gate_tx.push(GateMessage::Trigger(input));
                }
            }
            KeyCode::Tab => self.channel = (self.channel + 1) % NUM_CHANNELS,
            KeyCode::BackTab => self.channel = (self.channel + NUM_CHANNELS - 1) % NUM_CHANNELS,
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => self.cursor = (self.cursor + 1).min(EnvelopeSetting::COUNT - 1),
            KeyCode::Left => self.nudge(-1),
            KeyCode::Right => self.nudge(1),
            _ => {}
        }
    }

    /// Change the setting under the cursor and forward it to the engine.
    fn nudge(&mut self, delta: i32) {
        let Some(setting) = EnvelopeSetting::from_index(self.cursor) else {
            return;
        };
        let Some(config) = self.configs.get_mut(self.channel) else {
            return;
        };
        if config.change_value(setting, delta) {
            let message = SettingsMessage::new(self.channel, setting, config.get(setting));
            let _ = self.settings_tx.push(message);
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(10),   // Scopes and settings
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        render_status(frame, rows[0], &self.latest);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[1]);

        let scopes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Ratio(1, NUM_CHANNELS as u32); NUM_CHANNELS])
            .split(columns[0]);
        for (i, trace) in self.history.iter().enumerate() {
            let samples: Vec<u16> = trace.iter().copied().collect();
            render_scope(frame, scopes[i], i, &samples, i == self.channel);
        }

        if let Some(config) = self.configs.get(self.channel) {
            render_settings(frame, columns[1], self.channel, config, self.cursor);
        }

        let help = Paragraph::new(
            " [1-4] Gate  [T] Trigger  [Tab] Channel  [↑↓] Setting  [←→] Value  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[2]);
    }
}
