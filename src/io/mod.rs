// Purpose - external interfaces: MIDI destinations and the output log

pub mod log;
pub mod midi;

pub use log::OutputLog;
pub use midi::{MidiEvent, MidiOutput, MidiRecorder, NullOutput, TimedMidi};
