//! # Message Log
//!
//! Bounded ring buffer of human-readable lines. The core appends; renderers read or drain.

use crate::config::LOG_CAPACITY;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Appends a line, evicting the oldest one when full.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptcrawl::MessageLog;
    ///
    /// let mut log = MessageLog::with_capacity(2);
    /// log.push("one");
    /// log.push("two");
    /// log.push("three");
    /// assert_eq!(log.recent(5), vec!["two", "three"]);
    /// ```
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{}", message);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// The last `n` lines, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&str> {
        let skip = self.entries.len().saturating_sub(n);
        self.iter().skip(skip).collect()
    }

    /// Removes and returns every buffered line.
    pub fn drain(&mut self) -> Vec<String> {
        self.entries.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
