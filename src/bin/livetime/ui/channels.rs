//! Channel activity widget - one meter per MIDI channel, kicked by note-ons

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use livetime::io::MidiEvent;
use livetime::MIDI_CHANNELS;

/// Level lost per second, as a fraction of full scale
const DECAY_PER_SECOND: f32 = 2.0;
/// Level shown for messages without a velocity
const CONTROL_LEVEL: f32 = 0.25;

#[derive(Debug, Clone, Default)]
pub struct ChannelMeters {
    levels: [f32; MIDI_CHANNELS],
}

impl ChannelMeters {
    pub fn hit(&mut self, event: &MidiEvent) {
        let level = match *event {
            MidiEvent::NoteOn { velocity, .. } => velocity as f32 / 127.0,
            MidiEvent::ControlChange { .. } | MidiEvent::ProgramChange { .. } => CONTROL_LEVEL,
            MidiEvent::NoteOff { .. } => return,
        };
        if let Some(slot) = self.levels.get_mut(event.channel() as usize) {
            *slot = slot.max(level);
        }
    }

    pub fn decay(&mut self, seconds: f32) {
        for level in &mut self.levels {
            *level = (*level - DECAY_PER_SECOND * seconds).max(0.0);
        }
    }

    pub fn level(&self, channel: usize) -> f32 {
        self.levels.get(channel).copied().unwrap_or(0.0)
    }
}

pub fn render_channels(frame: &mut Frame, area: Rect, meters: &ChannelMeters) {
    let bars: Vec<Bar> = (0..MIDI_CHANNELS)
        .map(|channel| {
            let level = meters.level(channel);
            Bar::default()
                .value((level * 100.0).round() as u64)
                .label(Line::from(format!("{:>2}", channel + 1)))
                .style(Style::default().fg(if level > 0.0 { Color::Green } else { Color::DarkGray }))
        })
        .collect();

    let chart = BarChart::default()
        .block(Block::default().title(" Channels ").borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .bar_width(3)
        .bar_gap(1)
        .max(100);

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_sets_level_and_decays() {
        let mut meters = ChannelMeters::default();
        meters.hit(&MidiEvent::NoteOn { channel: 3, key: 60, velocity: 127 });
        assert_eq!(meters.level(3), 1.0);

        meters.decay(0.25);
        assert_eq!(meters.level(3), 0.5);
        meters.decay(10.0);
        assert_eq!(meters.level(3), 0.0);
    }

    #[test]
    fn test_note_off_does_not_light_meter() {
        let mut meters = ChannelMeters::default();
        meters.hit(&MidiEvent::NoteOff { channel: 0, key: 60, velocity: 0 });
        assert_eq!(meters.level(0), 0.0);
        assert_eq!(meters.level(99), 0.0);
    }
}
