use std::collections::VecDeque;

use tracing::trace;

use super::error::SchedulerError;

/*
Event Queue
===========

An ordered list of pending actions. The queue does not know what time it is;
the clock asks it for "everything due at or before t" by calling `pop_ready`
until it returns `None`.

  time ─────────────────────────────────────────────→
        [0.0 a] [0.5 b] [0.5 c] [1.0 d] [2.0 e]
                   ↑       ↑
                   equal times keep arrival order (b was added before c)

Insertion is a binary search for the first entry strictly later than the new
time, so a new entry lands *after* every entry already at the same time. That
makes same-instant entries first-in first-out, which is what keeps recursive
self-scheduling deterministic.
*/

/// Opaque identifier handed out for each queued entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryRef(u64);

impl EntryRef {
    pub fn index(&self) -> u64 {
        self.0
    }
}

/// A queued action and the virtual time it is due at
#[derive(Debug)]
pub struct ScheduledEntry<T> {
    /// Virtual time in seconds
    pub time: f64,
    /// Clock epoch at the moment the entry was added
    pub epoch: u64,
    pub entry_ref: EntryRef,
    pub action: T,
}

/// Time-ordered, FIFO-stable queue of scheduled entries
#[derive(Debug)]
pub struct EventQueue<T> {
    entries: VecDeque<ScheduledEntry<T>>,
    next_ref: u64,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_ref: 0,
        }
    }

    /// Insert an action at `time`, after any entries already at that time
    pub fn add(&mut self, time: f64, epoch: u64, action: T) -> Result<EntryRef, SchedulerError> {
        if !time.is_finite() {
            return Err(SchedulerError::InvalidTime { time });
        }

        let entry_ref = EntryRef(self.next_ref);
        self.next_ref += 1;

        let idx = self.entries.partition_point(|e| e.time <= time);
        trace!(time, idx, entry = entry_ref.0, "queue add");

        self.entries.insert(
            idx,
            ScheduledEntry {
                time,
                epoch,
                entry_ref,
                action,
            },
        );

        Ok(entry_ref)
    }

    /// Remove and return the earliest entry due at or before `threshold`
    pub fn pop_ready(&mut self, threshold: f64) -> Option<ScheduledEntry<T>> {
        match self.entries.front() {
            Some(entry) if entry.time <= threshold => self.entries.pop_front(),
            _ => None,
        }
    }

    /// Time of the earliest pending entry
    pub fn peek_time(&self) -> Option<f64> {
        self.entries.front().map(|e| e.time)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending entry. Refs keep counting up.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
