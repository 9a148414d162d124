//! Scope widget - one trace per envelope channel

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use quad_envgen::SAMPLE_MAX;

pub const CHANNEL_COLORS: [Color; 4] = [Color::Cyan, Color::Magenta, Color::Yellow, Color::Green];

/// Render the recent history of one channel
pub fn render_scope(frame: &mut Frame, area: Rect, channel: usize, history: &[u16], selected: bool) {
    let title = format!(" {} ", (b'A' + channel as u8) as char);
    let border = if selected { Color::White } else { Color::DarkGray };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let data: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, &sample)| {
            let x = i as f64 / history.len().max(1) as f64;
            let y = f64::from(sample) / f64::from(SAMPLE_MAX);
            (x, y)
        })
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(CHANNEL_COLORS[channel % CHANNEL_COLORS.len()]))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
