use tracing::debug;

use crate::Engine;

impl Engine {
    /// Virtual time published by the clock
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Scheduling position of the current scope
    pub fn cursor(&self) -> f64 {
        self.scopes.current().cursor
    }

    /// Move the cursor to `time`
    pub fn at(&mut self, time: f64) {
        self.scopes.current_mut().cursor = time;
    }

    /// Move the cursor forward by `duration`
    pub fn wait(&mut self, duration: f64) {
        self.scopes.current_mut().cursor += duration;
    }

    /// Move the cursor to the first multiple of `interval` at or after `now()`.
    ///
    /// A non-finite or non-positive interval leaves the cursor where it is.
    pub fn next(&mut self, interval: f64) {
        if !interval.is_finite() || interval <= 0.0 {
            debug!(interval, "next: invalid interval ignored");
            return;
        }

        let multiple = (self.now() / interval).ceil().max(0.0);
        self.at(multiple * interval);
    }

    /// Run `action` in a copy of the current scope.
    ///
    /// Cursor and channel changes made inside do not leak out.
    pub fn scoped<F, R>(&mut self, action: F) -> R
    where
        F: FnOnce(&mut Engine) -> R,
    {
        let scope = *self.scopes.current();
        let mut guard = self.push_scope(scope);
        action(&mut *guard)
    }

    /// Default MIDI channel of the current scope
    pub fn current_channel(&self) -> u8 {
        self.scopes.current().channel
    }

    /// Set the default MIDI channel for later messages in this scope.
    ///
    /// Channels above 15 are ignored.
    pub fn channel(&mut self, channel: u8) {
        if channel > 15 {
            debug!(channel, "channel: out of range, ignored");
            return;
        }
        self.scopes.current_mut().channel = channel;
    }
}
