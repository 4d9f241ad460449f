//! Transport bar widget - shows virtual time, tempo and queue stats

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::UiStateUpdate;

/// Format seconds as HH:MM:SS.mmm
pub fn format_time(seconds: f64) -> String {
    let millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let (hours, rest) = (millis / 3_600_000, millis % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (secs, millis) = (rest / 1000, rest % 1000);
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

pub fn render_transport(frame: &mut Frame, area: Rect, state: &UiStateUpdate) {
    let block = Block::default().title(" livetime ").borders(Borders::ALL);

    let (symbol, label, color) = if state.paused {
        ("⏸", "Paused", Color::Yellow)
    } else {
        ("▶", "Running", Color::Green)
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", format_time(state.now)),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("BPM: {:.0}  ", state.bpm()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{symbol} {label}  "), Style::default().fg(color)),
        Span::styled(
            format!("Epoch {}  ", state.epoch),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("Queued {}  Loops {}", state.pending, state.loops),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
