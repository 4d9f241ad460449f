pub mod engine; // Queue, virtual clock, scopes
pub mod io; // MIDI sink and output log
pub mod timing; // Script-facing combinators

pub use engine::clock::{ManualClock, SystemClock, WallClock};
pub use engine::config::EngineConfig;
pub use engine::error::{ActionError, ActionOutcome, SchedulerError};
pub use engine::scope::Scope;
pub use engine::{Engine, ScopeGuard};
pub use timing::Count;

/// Number of MIDI channels a scope can address
pub const MIDI_CHANNELS: usize = 16;
