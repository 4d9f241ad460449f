//! Messages exchanged between the UI thread and the engine thread
//!
//! Snapshots are `Copy` so the engine thread never allocates to publish them.

/// Commands sent from the UI thread to the engine thread
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlMessage {
    TogglePause,
    /// Bump the epoch and run the script again
    Reload,
    SpeedUp,
    SpeedDown,
    Quit,
}

/// Transport snapshot published by the engine thread
#[derive(Clone, Copy, Debug, Default)]
pub struct UiStateUpdate {
    /// Virtual time in seconds
    pub now: f64,
    pub speed: f64,
    pub paused: bool,
    pub epoch: u64,
    /// Entries waiting in the queue
    pub pending: usize,
    /// Running live loops
    pub loops: usize,
}

impl UiStateUpdate {
    pub fn bpm(&self) -> f64 {
        self.speed * 60.0
    }
}
