//! quadeg - terminal simulator for the quad envelope generator
//!
//! Run with: cargo run --features serde -- [preset.json]
//!
//! A preset is a JSON array of up to four channel objects keyed by setting
//! name, e.g. `[{"type": 1, "seg1": 40}, {"trigger_input": 4}]`.

mod app;
mod ui;

use app::Simulator;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let mut simulator = Simulator::new();
    if let Some(path) = std::env::args().nth(1) {
        simulator = simulator.preset(path)?;
    }
    simulator.run()
}
