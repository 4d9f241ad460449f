use std::collections::VecDeque;

/// Bounded, append-only list of output messages.
///
/// Scripts log here and the engine reports failed actions here. When the
/// capacity is reached the oldest line is dropped.
#[derive(Debug, Clone)]
pub struct OutputLog {
    lines: VecDeque<String>,
    capacity: usize,
    /// Lines ever written, including dropped and cleared ones
    written: u64,
}

impl OutputLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
            written: 0,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
        self.written += 1;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Lines written after the first `seen` lines, as far as still retained
    pub fn since(&self, seen: u64) -> impl Iterator<Item = &str> {
        let fresh = self.written.saturating_sub(seen).min(self.lines.len() as u64) as usize;
        self.lines
            .iter()
            .skip(self.lines.len() - fresh)
            .map(String::as_str)
    }
}

impl Default for OutputLog {
    fn default() -> Self {
        Self::new(1000)
    }
}
