use alloc::collections::VecDeque;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// An accepted value and the time it was sampled.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f32,
    /// Seconds since epoch (or boot when the clock is not synced)
    pub timestamp: u32,
}

impl Reading {
    pub const fn new(value: f32, timestamp: u32) -> Self {
        Self { value, timestamp }
    }
}

/// Fixed-capacity FIFO of accepted readings.
///
/// Pushing onto a full buffer drops the oldest reading first, so `len()` never
/// exceeds `capacity()`.
#[derive(Debug, Clone)]
pub struct ReadingBuffer {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl ReadingBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, returning the evicted one if the buffer was full.
    pub fn push(&mut self, reading: Reading) -> Option<Reading> {
        let evicted = if self.readings.len() >= self.capacity {
            self.readings.pop_front()
        } else {
            None
        };
        self.readings.push_back(reading);
        evicted
    }

    /// Most recently accepted reading
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    pub fn to_vec(&self) -> Vec<Reading> {
        self.readings.iter().copied().collect()
    }
}
