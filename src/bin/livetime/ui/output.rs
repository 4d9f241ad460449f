//! Output widget - the most recent script log lines, errors highlighted

use std::collections::VecDeque;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_output(frame: &mut Frame, area: Rect, log: &VecDeque<String>) {
    let block = Block::default().title(" Output ").borders(Borders::ALL);
    let visible = block.inner(area).height as usize;

    let lines: Vec<Line> = log
        .iter()
        .skip(log.len().saturating_sub(visible))
        .map(|line| {
            let color = if line.starts_with("error:") {
                Color::Red
            } else {
                Color::White
            };
            Line::styled(line.as_str(), Style::default().fg(color))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
