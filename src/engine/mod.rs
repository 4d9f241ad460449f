// Purpose: the virtual-time scheduling engine.
// Owns the queue, the clock, the scope stack and the loop registry, and drains
// due entries on every tick. The user-facing combinators live in `timing`.

pub mod clock;
pub mod config;
pub mod env;
pub mod error;
pub mod queue;
pub mod scope;
pub(crate) mod task;

use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use self::clock::{Clock, SystemClock, WallClock};
use self::config::EngineConfig;
use self::env::Env;
use self::error::{ActionError, ActionOutcome, SchedulerError};
use self::queue::{EntryRef, EventQueue};
use self::scope::{Scope, ScopeStack};
use self::task::{LoopRegistry, Task};
use crate::io::{MidiEvent, MidiOutput, NullOutput, OutputLog};

/// A scheduling session.
///
/// Everything a script touches hangs off this value: there is no global
/// state, so independent engines can coexist (one per test, one per session).
/// The engine is single-threaded; build it on the thread that drives it.
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) clock: Clock,
    wall: Box<dyn WallClock>,
    pub(crate) queue: EventQueue<Task>,
    pub(crate) scopes: ScopeStack,
    pub(crate) loops: LoopRegistry,
    pub(crate) output: OutputLog,
    pub(crate) env: Env,
    midi: Box<dyn MidiOutput>,
    /// Bumped by every `reset`; a chain that sees it change mid-step stops
    pub(crate) generation: u64,
}

impl Engine {
    /// Create an engine reading the system monotonic clock
    pub fn new(config: EngineConfig) -> Result<Self, SchedulerError> {
        Self::with_wall_clock(config, SystemClock::new())
    }

    /// Create an engine reading time from `wall`
    pub fn with_wall_clock(
        config: EngineConfig,
        wall: impl WallClock + 'static,
    ) -> Result<Self, SchedulerError> {
        if config.default_channel > 15 {
            return Err(SchedulerError::InvalidChannel {
                channel: config.default_channel,
            });
        }
        let mut clock = Clock::new();
        clock.set_speed(config.initial_speed)?;

        Ok(Self {
            scopes: ScopeStack::new(Scope::new(0.0, config.default_channel)),
            output: OutputLog::new(config.max_log_lines),
            clock,
            wall: Box::new(wall),
            queue: EventQueue::new(),
            loops: LoopRegistry::default(),
            env: Env::default(),
            midi: Box::new(NullOutput),
            generation: 0,
            config,
        })
    }

    /// Route MIDI produced by scheduled actions to `output`
    pub fn with_midi_output(mut self, output: impl MidiOutput + 'static) -> Self {
        self.midi = Box::new(output);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn output(&self) -> &OutputLog {
        &self.output
    }

    /// Number of entries waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Time of the next queued entry
    pub fn next_due(&self) -> Option<f64> {
        self.queue.peek_time()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Start accumulating virtual time from the current wall-clock reading
    pub fn start(&mut self) {
        let wall_now = self.wall.now();
        self.clock.start(wall_now);
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        let wall_now = self.wall.now();
        self.clock.resume(wall_now);
    }

    pub fn toggle_pause(&mut self) {
        let wall_now = self.wall.now();
        self.clock.toggle_pause(wall_now);
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn epoch(&self) -> u64 {
        self.clock.epoch()
    }

    /// Soft-cancel every `repeat` chain and every loop that the next script
    /// run does not register again
    pub fn bump_epoch(&mut self) -> u64 {
        self.clock.bump_epoch()
    }

    /// Stop the clock and drop all scheduling state, including the values
    /// kept with `define`/`set`.
    ///
    /// The output log is kept. A chain whose own step called `reset` does not
    /// reschedule itself.
    pub fn reset(&mut self) {
        debug!(pending = self.queue.len(), "engine reset");
        self.clock.reset();
        // Clock::reset restores the default speed; honour the configured one
        if self.clock.set_speed(self.config.initial_speed).is_err() {
            warn!(speed = self.config.initial_speed, "configured speed rejected after reset");
        }
        self.queue.clear();
        self.scopes.reset(self.root_scope());
        self.loops.clear();
        self.env.clear();
        self.generation += 1;
    }

    /// Run a script body at the root scope.
    ///
    /// Errors and panics from the script are written to the output log.
    pub fn run_script<F, O>(&mut self, script: F)
    where
        F: FnOnce(&mut Engine) -> O,
        O: ActionOutcome,
    {
        let depth = self.scopes.depth();
        let result = panic::catch_unwind(AssertUnwindSafe(|| script(&mut *self).into_outcome()))
            .unwrap_or_else(|payload| Err(ActionError::from_panic(payload)));
        self.scopes.truncate(depth);

        self.report(result);
    }

    /// Replace the running script.
    ///
    /// Bumps the epoch so stale chains stop at their next step, puts the root
    /// cursor back to 0 and runs `script`. Entries already queued by `fire`
    /// still run.
    pub fn reload<F, O>(&mut self, script: F)
    where
        F: FnOnce(&mut Engine) -> O,
        O: ActionOutcome,
    {
        let epoch = self.bump_epoch();
        debug!(epoch, now = self.clock.now(), "reload");
        self.scopes.reset(self.root_scope());
        self.run_script(script);
    }

    // ---------------------------------------------------------------------
    // Ticking
    // ---------------------------------------------------------------------

    /// Advance virtual time from the wall clock and run everything now due.
    ///
    /// Does nothing until [`Engine::start`] is called.
    pub fn tick(&mut self) {
        if !self.clock.is_running() {
            return;
        }

        let wall_now = self.wall.now();
        let threshold = self.clock.advance(wall_now);
        self.drain(threshold);
    }

    /// Start, then tick every `tick_period` until `should_stop` returns true
    /// or the engine is reset.
    pub fn run_until<F>(&mut self, mut should_stop: F)
    where
        F: FnMut(&mut Engine) -> bool,
    {
        if !self.clock.is_running() {
            self.start();
        }

        while self.clock.is_running() {
            if should_stop(self) {
                break;
            }
            self.tick();
            std::thread::sleep(self.config.tick_period);
        }
    }

    fn drain(&mut self, threshold: f64) {
        while let Some(entry) = self.queue.pop_ready(threshold) {
            self.clock.set_event_time(entry.time);
            self.run_task(entry.time, entry.action);
        }
        self.clock.publish();
    }

    // ---------------------------------------------------------------------
    // Internals shared with the combinators
    // ---------------------------------------------------------------------

    pub(crate) fn root_scope(&self) -> Scope {
        Scope::new(0.0, self.config.default_channel)
    }

    pub(crate) fn schedule(&mut self, time: f64, task: Task) -> Result<EntryRef, SchedulerError> {
        self.queue.add(time, self.clock.epoch(), task)
    }

    /// Run `action` inside a fresh frame holding `scope`, catching panics
    pub(crate) fn invoke<F>(&mut self, scope: Scope, action: F) -> Result<(), ActionError>
    where
        F: FnOnce(&mut Engine) -> Result<(), ActionError>,
    {
        let mut guard = self.push_scope(scope);
        panic::catch_unwind(AssertUnwindSafe(|| action(&mut *guard)))
            .unwrap_or_else(|payload| Err(ActionError::from_panic(payload)))
    }

    pub(crate) fn report(&mut self, result: Result<(), ActionError>) {
        if let Err(err) = result {
            warn!(at = self.clock.now(), error = %err, "action failed");
            self.output.push(format!("error: {err}"));
        }
    }

    /// Send a MIDI event now. Out-of-range events are dropped.
    pub fn send_midi(&mut self, event: MidiEvent) {
        if !event.is_valid() {
            debug!(?event, "out of range midi event dropped");
            return;
        }
        self.midi.send(self.clock.now(), event);
    }

    /// Push `scope` for the lifetime of the returned guard.
    ///
    /// Dropping the guard pops the frame along with anything pushed above it,
    /// on every exit path including unwinding.
    pub fn push_scope(&mut self, scope: Scope) -> ScopeGuard<'_> {
        let depth = self.scopes.depth();
        self.scopes.push(scope);
        ScopeGuard {
            engine: self,
            depth,
        }
    }

    /// Number of scope frames, root included
    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    pub fn scope(&self) -> &Scope {
        self.scopes.current()
    }
}

/// Scope frame held open for as long as the guard lives
pub struct ScopeGuard<'a> {
    engine: &'a mut Engine,
    depth: usize,
}

impl Deref for ScopeGuard<'_> {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        self.engine
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Engine {
        self.engine
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.engine.scopes.truncate(self.depth);
    }
}
