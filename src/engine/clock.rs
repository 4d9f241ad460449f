//! Virtual clock
//!
//! Converts wall-clock readings into speed-scaled virtual time. The clock
//! never reads the wall clock itself; the engine passes readings in from a
//! [`WallClock`] so tests can step time by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use tracing::debug;

use super::error::SchedulerError;

/// Source of monotonic wall-clock time, in seconds
pub trait WallClock {
    fn now(&self) -> f64;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven wall clock. Clones share the same reading.
///
/// ```
/// use livetime::engine::clock::{ManualClock, WallClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(1.5);
/// assert_eq!(clock.now(), 1.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    seconds: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.seconds.set(self.seconds.get() + seconds);
    }

    pub fn set(&self, seconds: f64) {
        self.seconds.set(seconds);
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> f64 {
        self.seconds.get()
    }
}

/// Speed-scaled virtual clock with pause and epoch tracking
#[derive(Debug, Clone)]
pub struct Clock {
    /// Accumulated virtual time in seconds
    virtual_time: f64,
    /// Externally observable time (see [`Clock::now`])
    now: f64,
    /// Virtual seconds per wall second, always > 0
    speed: f64,
    paused: bool,
    running: bool,
    /// Generation counter, bumped once per script reload
    epoch: u64,
    /// Wall-clock reading at the previous advance
    last_wall_tick: f64,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            virtual_time: 0.0,
            now: 0.0,
            speed: 1.0,
            paused: false,
            running: false,
            epoch: 0,
            last_wall_tick: 0.0,
        }
    }

    /// Begin accumulating time from `wall_now`
    pub fn start(&mut self, wall_now: f64) {
        debug!(wall_now, "clock start");
        self.running = true;
        self.last_wall_tick = wall_now;
    }

    /// Accumulate the wall time elapsed since the previous call.
    ///
    /// Deltas are dropped while paused or stopped. Returns the new virtual time.
    pub fn advance(&mut self, wall_now: f64) -> f64 {
        let delta = (wall_now - self.last_wall_tick).max(0.0);

        if self.running && !self.paused {
            self.virtual_time += delta * self.speed;
        }

        self.last_wall_tick = wall_now;
        self.virtual_time
    }

    /// Last published virtual time.
    ///
    /// While the engine drains, this is the due time of the entry currently
    /// running; between ticks it is the virtual time reached by the last tick.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Virtual time accumulated so far, published or not
    pub fn virtual_time(&self) -> f64 {
        self.virtual_time
    }

    pub(crate) fn set_event_time(&mut self, time: f64) {
        self.now = time;
    }

    pub(crate) fn publish(&mut self) {
        self.now = self.virtual_time;
    }

    pub fn pause(&mut self) {
        debug!(at = self.virtual_time, "clock pause");
        self.paused = true;
    }

    /// Resume without a time jump: the pause duration is never accumulated
    pub fn resume(&mut self, wall_now: f64) {
        debug!(at = self.virtual_time, "clock resume");
        self.paused = false;
        self.last_wall_tick = wall_now;
    }

    pub fn toggle_pause(&mut self, wall_now: f64) {
        if self.paused {
            self.resume(wall_now);
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), SchedulerError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(SchedulerError::InvalidSpeed { speed });
        }

        self.speed = speed;
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a new generation, returns it
    pub fn bump_epoch(&mut self) -> u64 {
        self.epoch += 1;
        debug!(epoch = self.epoch, "epoch bump");
        self.epoch
    }

    /// Stop and return to the initial state
    pub fn reset(&mut self) {
        debug!("clock reset");
        *self = Self::new();
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
