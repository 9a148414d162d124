//! Status line and settings list

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use quad_envgen::{
    io::DigitalInput, settings::EnvelopeType, ChannelConfig, EnvelopeSetting, CORE_ISR_FREQ,
};

use super::scope::CHANNEL_COLORS;
use super::state::ScopeFrame;

/// Render the status bar: elapsed time, gates, and per-channel activity
pub fn render_status(frame: &mut Frame, area: Rect, latest: &ScopeFrame) {
    let block = Block::default().title(" quadeg ").borders(Borders::ALL);

    let seconds = latest.tick as f64 / f64::from(CORE_ISR_FREQ);
    let mut spans = vec![Span::styled(
        format!(" {seconds:8.2}s  "),
        Style::default().fg(Color::DarkGray),
    )];

    for input in DigitalInput::ALL {
        let held = latest.gates & input.mask() != 0;
        spans.push(Span::styled(
            format!("TR{} ", input.index() + 1),
            Style::default().fg(if held { Color::Green } else { Color::DarkGray }),
        ));
    }
    spans.push(Span::raw(" "));

    for (i, ch) in latest.channels.iter().enumerate() {
        let lit = ch.activity > 0;
        let mut text = format!("{}", (b'A' + i as u8) as char);
        if ch.pending > 0 {
            text.push_str(&format!(" +{} {:>4}ms", ch.pending, ch.next_delay_us / 1000));
        }
        text.push_str("  ");
        spans.push(Span::styled(
            text,
            Style::default().fg(if lit { CHANNEL_COLORS[i] } else { Color::DarkGray }),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn describe(config: &ChannelConfig, setting: EnvelopeSetting) -> String {
    let value = config.get(setting);
    match setting {
        EnvelopeSetting::Type => EnvelopeType::from_value(value).name().to_string(),
        EnvelopeSetting::TriggerDelayMode => format!("{:?}", config.delay_mode()),
        EnvelopeSetting::AttackResetBehaviour => format!("{:?}", config.attack_reset()),
        EnvelopeSetting::AttackFallingGateBehaviour => format!("{:?}", config.attack_falling_gate()),
        EnvelopeSetting::DecayReleaseResetBehaviour => format!("{:?}", config.decay_release_reset()),
        EnvelopeSetting::AttackShape => format!("{:?}", config.attack_shape()),
        EnvelopeSetting::DecayShape => format!("{:?}", config.decay_shape()),
        EnvelopeSetting::ReleaseShape => format!("{:?}", config.release_shape()),
        EnvelopeSetting::Cv1 | EnvelopeSetting::Cv2 | EnvelopeSetting::Cv3 | EnvelopeSetting::Cv4 => {
            format!("{:?}", quad_envgen::settings::CvMapping::from_value(value))
        }
        _ => value.to_string(),
    }
}

/// Render the settings of the selected channel
pub fn render_settings(
    frame: &mut Frame,
    area: Rect,
    channel: usize,
    config: &ChannelConfig,
    cursor: usize,
) {
    let block = Block::default()
        .title(format!(" Channel {} ", (b'A' + channel as u8) as char))
        .borders(Borders::ALL);

    let items: Vec<ListItem> = EnvelopeSetting::ALL
        .iter()
        .map(|&s| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<22}", s.attributes().name),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(describe(config, s)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}
