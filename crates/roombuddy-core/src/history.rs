//! Bounded history of recent filter events
//!
//! Consumers such as a status page show the last few things the filter did
//! next to the buffered readings. Only the newest [`HISTORY_CAPACITY`] events
//! are kept.

use heapless::Deque;
use serde::{Deserialize, Serialize};

use crate::filter::Decision;
use crate::sensors::ChannelId;

pub const HISTORY_CAPACITY: usize = 20;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    Decision { decision: Decision, value: f32 },
    MalformedSample,
    ReadFailure,
    Rearmed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FilterEvent {
    pub channel: ChannelId,
    pub timestamp: u32,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub struct EventHistory {
    events: Deque<FilterEvent, HISTORY_CAPACITY>,
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHistory {
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    pub fn record(&mut self, event: FilterEvent) {
        if self.events.is_full() {
            self.events.pop_front();
        }
        // Cannot fail, a slot was freed above
        let _ = self.events.push_back(event);
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &FilterEvent> {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&FilterEvent> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
