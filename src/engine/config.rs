use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Engine settings
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Wall-clock period between ticks when driven by `Engine::run_until`
    pub tick_period: Duration,
    /// Virtual seconds per wall second at start and after reset
    pub initial_speed: f64,
    /// Output log capacity; oldest lines are dropped first
    pub max_log_lines: usize,
    /// MIDI channel of the root scope
    pub default_channel: u8,
}

impl EngineConfig {
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    pub fn with_initial_speed(mut self, speed: f64) -> Self {
        self.initial_speed = speed;
        self
    }

    pub fn with_max_log_lines(mut self, max_log_lines: usize) -> Self {
        self.max_log_lines = max_log_lines;
        self
    }

    pub fn with_default_channel(mut self, channel: u8) -> Self {
        self.default_channel = channel;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(1),
            initial_speed: 1.0,
            max_log_lines: 1000,
            default_channel: 0,
        }
    }
}
