// SPDX-License-Identifier: MIT

//! Bounded per-project event ring buffer (§3: "retained in the Store in
//! bounded ring form... so late subscribers can replay", §6 default 10,000).

use foreman_core::Event;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRing {
    capacity: usize,
    entries: VecDeque<Event>,
}

impl EventRing {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: VecDeque::new() }
    }

    pub fn push(&mut self, event: Event) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    /// Events with `seq > from_seq`, in order. If `from_seq` is older than
    /// the oldest retained event, replay starts from whatever is retained
    /// (callers needing guaranteed gaplessness must also consult the WAL).
    pub fn after(&self, from_seq: u64) -> Vec<Event> {
        self.entries.iter().filter(|e| e.seq > from_seq).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The highest retained `seq`, or 0 if nothing has been appended yet.
    pub fn latest_seq(&self) -> u64 {
        self.entries.back().map_or(0, |e| e.seq)
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
