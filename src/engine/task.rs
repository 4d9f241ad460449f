//! Queue payloads and how the engine runs them.
//!
//! Recurring chains (`repeat`, `live_loop`) do not capture mutable state in
//! closures. Each step is a plain value carrying where the chain is (step
//! index, remaining count, epoch, chain id); running it either produces the
//! next step's value, which goes back into the queue, or ends the chain.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use super::error::ActionError;
use super::scope::Scope;
use super::Engine;
use crate::timing::Count;

pub(crate) type OnceAction = Box<dyn FnOnce(&mut Engine) -> Result<(), ActionError>>;
pub(crate) type StepAction = Box<dyn FnMut(&mut Engine, u64) -> Result<(), ActionError>>;
pub(crate) type LoopAction = Box<dyn FnMut(&mut Engine) -> Result<(), ActionError>>;

pub(crate) enum Task {
    /// One-shot action with the scope captured when it was scheduled
    Fire { scope: Scope, action: OnceAction },
    Repeat(RepeatChain),
    Loop(LoopStep),
}

pub(crate) struct RepeatChain {
    /// Cursor at the `repeat` call; step `k` is due at `origin + k * interval`
    pub origin: f64,
    pub interval: f64,
    /// Index passed to the action on the next firing
    pub step: u64,
    pub remaining: Count,
    /// Epoch at the `repeat` call
    pub epoch: u64,
    pub channel: u8,
    pub action: StepAction,
}

impl RepeatChain {
    pub fn time_of(&self, step: u64) -> f64 {
        self.origin + step as f64 * self.interval
    }
}

pub(crate) struct LoopStep {
    pub name: String,
    pub chain: u64,
    pub channel: u8,
}

pub(crate) struct LoopEntry {
    /// `None` while the action is running
    pub action: Option<LoopAction>,
    pub active: bool,
    /// Epoch of the last `live_loop` call for this name
    pub epoch: u64,
    /// Identifies the chain currently allowed to run
    pub chain: u64,
}

/// Name-keyed registry of live loops
#[derive(Default)]
pub(crate) struct LoopRegistry {
    entries: HashMap<String, LoopEntry>,
    next_chain: u64,
}

impl LoopRegistry {
    pub fn get_mut(&mut self, name: &str) -> Option<&mut LoopEntry> {
        self.entries.get_mut(name)
    }

    pub fn get(&self, name: &str) -> Option<&LoopEntry> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: &str, entry: LoopEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    pub fn next_chain(&mut self) -> u64 {
        let chain = self.next_chain;
        self.next_chain += 1;
        chain
    }

    pub fn active_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.active)
            .map(|(name, _)| name.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Engine {
    pub(crate) fn run_task(&mut self, time: f64, task: Task) {
        match task {
            Task::Fire { scope, action } => {
                let result = self.invoke(scope, action);
                self.report(result);
            }
            Task::Repeat(chain) => self.step_repeat(time, chain),
            Task::Loop(step) => self.step_loop(time, step),
        }
    }

    fn step_repeat(&mut self, time: f64, mut chain: RepeatChain) {
        if chain.epoch != self.clock.epoch() {
            trace!(epoch = chain.epoch, "stale repeat chain dropped");
            return;
        }
        if chain.remaining.is_exhausted() {
            return;
        }

        let step = chain.step;
        let generation = self.generation;
        let action = &mut chain.action;
        let result = self.invoke(Scope::new(time, chain.channel), |engine| action(engine, step));
        self.report(result);

        if self.generation != generation {
            trace!("repeat chain dropped by reset");
            return;
        }

        chain.step += 1;
        chain.remaining = chain.remaining.decrement();
        if chain.remaining.is_exhausted() {
            return;
        }

        let next = chain.time_of(chain.step);
        if let Err(err) = self.schedule(next, Task::Repeat(chain)) {
            warn!(error = %err, "repeat chain ended");
        }
    }

    fn step_loop(&mut self, time: f64, step: LoopStep) {
        let epoch = self.clock.epoch();
        let Some(entry) = self.loops.get_mut(&step.name) else {
            return;
        };
        if !entry.active || entry.chain != step.chain {
            return;
        }
        if entry.epoch != epoch {
            debug!(name = %step.name, "loop not registered by the current script, stopping");
            entry.active = false;
            return;
        }
        let Some(mut action) = entry.action.take() else {
            return;
        };

        let generation = self.generation;
        let mut cursor_after = time;
        let result = self.invoke(Scope::new(time, step.channel), |engine| {
            let result = action(engine);
            cursor_after = engine.cursor();
            result
        });
        self.report(result);

        if self.generation != generation {
            trace!(name = %step.name, "loop dropped by reset");
            return;
        }

        // The action may have hot-swapped itself or stopped the loop while
        // it ran
        let keep_going = match self.loops.get_mut(&step.name) {
            Some(entry) if entry.chain == step.chain => {
                if entry.action.is_none() {
                    entry.action = Some(action);
                }
                if entry.active && cursor_after <= time {
                    debug!(name = %step.name, "loop did not move its cursor forward, stopping");
                    entry.active = false;
                }
                entry.active
            }
            _ => false,
        };

        if !keep_going {
            return;
        }

        let name = step.name.clone();
        if let Err(err) = self.schedule(cursor_after, Task::Loop(step)) {
            warn!(name = %name, error = %err, "loop ended");
            if let Some(entry) = self.loops.get_mut(&name) {
                entry.active = false;
            }
        }
    }
}
