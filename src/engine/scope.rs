#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dynamically scoped scheduling state visible to running code
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scope {
    /// Where the next `fire` lands, in virtual seconds
    pub cursor: f64,
    /// Default MIDI channel (0-15)
    pub channel: u8,
}

impl Scope {
    pub const ROOT: Scope = Scope {
        cursor: 0.0,
        channel: 0,
    };

    pub fn new(cursor: f64, channel: u8) -> Self {
        Self { cursor, channel }
    }

    /// Same channel, different cursor
    pub fn at(self, cursor: f64) -> Self {
        Self { cursor, ..self }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::ROOT
    }
}

/// LIFO stack of scopes. The bottom (root) frame is never popped.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    pub fn new(root: Scope) -> Self {
        Self { frames: vec![root] }
    }

    pub fn push(&mut self, scope: Scope) {
        self.frames.push(scope);
    }

    /// Pop the top frame. Returns `None` instead of popping the root.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    pub fn current(&self) -> &Scope {
        // The root frame is never removed
        &self.frames[self.frames.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut Scope {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    /// Number of frames, root included
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Pop frames until `depth` remain (never below the root)
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }

    /// Back to a single root frame
    pub fn reset(&mut self, root: Scope) {
        self.frames.clear();
        self.frames.push(root);
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new(Scope::ROOT)
    }
}
