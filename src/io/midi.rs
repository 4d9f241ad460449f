use std::cell::RefCell;
use std::rc::Rc;

#[cfg(feature = "rtrb")]
use rtrb::Producer;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::ProgramChange { channel, .. } => channel,
        }
    }

    /// Channel in 0-15 and every data byte in 0-127
    pub fn is_valid(&self) -> bool {
        let data_ok = match *self {
            MidiEvent::NoteOn { key, velocity, .. } | MidiEvent::NoteOff { key, velocity, .. } => {
                key <= 127 && velocity <= 127
            }
            MidiEvent::ControlChange {
                controller, value, ..
            } => controller <= 127 && value <= 127,
            MidiEvent::ProgramChange { program, .. } => program <= 127,
        };

        self.channel() <= 15 && data_ok
    }
}

/// A MIDI event stamped with the virtual time it was sent at
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMidi {
    pub time: f64,
    pub event: MidiEvent,
}

/// Destination for MIDI events produced by scheduled actions
pub trait MidiOutput {
    fn send(&mut self, time: f64, event: MidiEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl MidiOutput for NullOutput {
    fn send(&mut self, _time: f64, _event: MidiEvent) {}
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MidiRecorder {
    events: Rc<RefCell<Vec<TimedMidi>>>,
}

impl MidiRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TimedMidi> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl MidiOutput for MidiRecorder {
    fn send(&mut self, time: f64, event: MidiEvent) {
        self.events.borrow_mut().push(TimedMidi { time, event });
    }
}

/// Hands events to another thread. A full ring buffer drops the event.
#[cfg(feature = "rtrb")]
impl MidiOutput for Producer<TimedMidi> {
    fn send(&mut self, time: f64, event: MidiEvent) {
        if self.push(TimedMidi { time, event }).is_err() {
            tracing::trace!(?event, "midi ring buffer full, event dropped");
        }
    }
}
