// src/job/log_buffer.rs - Bounded operator log
use std::collections::VecDeque;

/// Bounded FIFO of log lines plus the text currently shown to the operator.
///
/// Clearing only blanks the rendered text. The retained history is shown
/// again on the next append.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<String>,
    capacity: usize,
    rendered: String,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            rendered: String::new(),
        }
    }

    /// Append a line, evicting the oldest once over capacity.
    /// An empty line is the clear sentinel.
    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        if entry.is_empty() {
            self.clear();
            return;
        }
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.rendered = self.entries.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
    }

    pub fn clear(&mut self) {
        self.rendered.clear();
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_keeps_history_for_next_render() {
        let mut log = LogBuffer::new(5);
        log.push("one");
        log.push("two");
        log.clear();
        assert_eq!(log.rendered(), "");
        log.clear();
        assert_eq!(log.rendered(), "");
        assert_eq!(log.len(), 2);
        log.push("three");
        assert_eq!(log.rendered(), "one\ntwo\nthree");
    }

    #[test]
    fn empty_push_clears() {
        let mut log = LogBuffer::new(5);
        log.push("one");
        log.push("");
        assert_eq!(log.rendered(), "");
        assert_eq!(log.len(), 1);
    }
}
