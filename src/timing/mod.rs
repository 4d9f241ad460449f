//! Temporal combinators
//!
//! The scripting surface of the engine. Everything here is a method on
//! [`Engine`](crate::Engine) and works in terms of two notions of time:
//!
//! - `now()`, where the clock is
//! - `cursor()`, where the *current scope* will schedule the next action
//!
//! A script moves the cursor with `at`/`wait`/`next`, then schedules at it
//! with `fire`, `repeat` or `live_loop`. Scheduled actions run later, inside
//! a tick, with the cursor they were scheduled at.
//!
//! ```
//! use livetime::{Engine, EngineConfig, engine::clock::ManualClock};
//!
//! let wall = ManualClock::new();
//! let mut engine = Engine::with_wall_clock(EngineConfig::default(), wall.clone()).unwrap();
//! engine.start();
//!
//! engine.wait(2.0);
//! engine.flog("two seconds in").unwrap();
//!
//! wall.advance(2.0);
//! engine.tick();
//! assert_eq!(engine.output().last(), Some("two seconds in"));
//! ```

mod cursor;
mod fire;
mod messages;
mod recurring;

use crate::engine::error::SchedulerError;
use crate::Engine;

/// How many times a `repeat` chain fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Forever,
    Times(u64),
}

impl Count {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Count::Times(0))
    }

    pub fn decrement(self) -> Self {
        match self {
            Count::Forever => Count::Forever,
            Count::Times(n) => Count::Times(n.saturating_sub(1)),
        }
    }
}

impl From<u64> for Count {
    fn from(n: u64) -> Self {
        Count::Times(n)
    }
}

impl Default for Count {
    fn default() -> Self {
        Count::Forever
    }
}

impl Engine {
    /// Set the playback speed. Speed 2 makes virtual time run twice as fast.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), SchedulerError> {
        self.clock.set_speed(speed)
    }

    pub fn get_speed(&self) -> f64 {
        self.clock.speed()
    }

    /// Set the speed when given one, then return the current speed
    pub fn speed(&mut self, speed: Option<f64>) -> Result<f64, SchedulerError> {
        if let Some(speed) = speed {
            self.set_speed(speed)?;
        }
        Ok(self.get_speed())
    }
}
