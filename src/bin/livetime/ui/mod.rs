//! TUI module for livetime
//!
//! Shows the transport, per-channel MIDI activity and the script output.

mod channels;
mod output;
pub mod state;
mod transport;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};

use livetime::io::TimedMidi;

use channels::{render_channels, ChannelMeters};
use output::render_output;
use state::{ControlMessage, UiStateUpdate};
use transport::render_transport;

/// Output lines kept for display
const LOG_LINES: usize = 200;

/// UI application state
pub struct UiApp {
    control_tx: Producer<ControlMessage>,
    state_rx: Consumer<UiStateUpdate>,
    log_rx: Consumer<String>,
    midi_rx: Consumer<TimedMidi>,
    /// Latest transport snapshot
    current_state: UiStateUpdate,
    log: VecDeque<String>,
    meters: ChannelMeters,
    last_frame: Instant,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        control_tx: Producer<ControlMessage>,
        state_rx: Consumer<UiStateUpdate>,
        log_rx: Consumer<String>,
        midi_rx: Consumer<TimedMidi>,
    ) -> Self {
        Self {
            control_tx,
            state_rx,
            log_rx,
            midi_rx,
            current_state: UiStateUpdate::default(),
            log: VecDeque::with_capacity(LOG_LINES),
            meters: ChannelMeters::default(),
            last_frame: Instant::now(),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_state();
            self.poll_log();
            self.poll_midi();

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

    /// Ask the engine thread to stop
    pub fn quit(&mut self) {
        self.should_quit = true;
        self.send(ControlMessage::Quit);
    }

    fn send(&mut self, message: ControlMessage) {
        if self.control_tx.push(message).is_err() {
            tracing::warn!(?message, "control buffer full, message dropped");
        }
    }

    fn poll_state(&mut self) {
        // Keep only the latest snapshot
        while let Ok(state) = self.state_rx.pop() {
            self.current_state = state;
        }
    }

    fn poll_log(&mut self) {
        while let Ok(line) = self.log_rx.pop() {
            if self.log.len() == LOG_LINES {
                self.log.pop_front();
            }
            self.log.push_back(line);
        }
    }

    fn poll_midi(&mut self) {
        let elapsed = self.last_frame.elapsed().as_secs_f32();
        self.last_frame = Instant::now();
        self.meters.decay(elapsed);

        while let Ok(timed) = self.midi_rx.pop() {
            self.meters.hit(&timed.event);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.quit(),
            KeyCode::Char(' ') => self.send(ControlMessage::TogglePause),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.log.clear();
                self.send(ControlMessage::Reload);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.send(ControlMessage::SpeedUp),
            KeyCode::Char('-') => self.send(ControlMessage::SpeedDown),
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Transport bar
                Constraint::Length(10), // Channel meters
                Constraint::Min(4),     // Output log
                Constraint::Length(1),  // Help bar
            ])
            .split(frame.area());

        render_transport(frame, chunks[0], &self.current_state);
        render_channels(frame, chunks[1], &self.meters);
        render_output(frame, chunks[2], &self.log);

        let help = Paragraph::new(" [Q] Quit  [Space] Pause/Resume  [R] Reload  [+/-] Tempo")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
