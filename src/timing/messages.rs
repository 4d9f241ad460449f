use crate::engine::error::SchedulerError;
use crate::io::MidiEvent;
use crate::Engine;

impl Engine {
    /// Play `pitch` at the cursor and release it `duration` seconds later.
    ///
    /// `channel` defaults to the scope's channel. Pitch, velocity or channel
    /// out of MIDI range drop the message when it is sent. A negative or NaN
    /// duration releases the note immediately.
    pub fn note(
        &mut self,
        pitch: u8,
        velocity: u8,
        duration: f64,
        channel: Option<u8>,
    ) -> Result<(), SchedulerError> {
        let channel = channel.unwrap_or_else(|| self.current_channel());

        self.fire(move |e: &mut Engine| {
            let on = MidiEvent::NoteOn {
                channel,
                key: pitch,
                velocity,
            };
            e.send_midi(on);
            // No release for a note that was never played
            if !on.is_valid() {
                return Ok(());
            }
            e.wait(duration.max(0.0));
            e.fire(move |e: &mut Engine| {
                e.send_midi(MidiEvent::NoteOff {
                    channel,
                    key: pitch,
                    velocity: 0,
                })
            })
        })
    }

    /// Send a control change at the cursor
    pub fn cc(&mut self, controller: u8, value: u8, channel: Option<u8>) -> Result<(), SchedulerError> {
        let channel = channel.unwrap_or_else(|| self.current_channel());
        self.fire(move |e: &mut Engine| {
            e.send_midi(MidiEvent::ControlChange {
                channel,
                controller,
                value,
            })
        })
    }

    /// Send a program change at the cursor
    pub fn program(&mut self, program: u8, channel: Option<u8>) -> Result<(), SchedulerError> {
        let channel = channel.unwrap_or_else(|| self.current_channel());
        self.fire(move |e: &mut Engine| e.send_midi(MidiEvent::ProgramChange { channel, program }))
    }

    /// Write a line to the output log now
    pub fn log(&mut self, message: impl Into<String>) {
        self.output.push(message.into());
    }

    /// Write a line to the output log at the cursor
    pub fn flog(&mut self, message: impl Into<String>) -> Result<(), SchedulerError> {
        let message = message.into();
        self.fire(move |e: &mut Engine| e.log(message))
    }

    pub fn clear_log(&mut self) {
        self.output.clear();
    }

    /// Clear the output log at the cursor
    pub fn fclear(&mut self) -> Result<(), SchedulerError> {
        self.fire(|e: &mut Engine| e.clear_log())
    }
}
