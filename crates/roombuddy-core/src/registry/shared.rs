use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::SensorRegistry;
use crate::filter::{FilterError, Outcome};
use crate::history::FilterEvent;
use crate::sensors::ChannelId;
use crate::storage::{ChannelSnapshot, MeasurementsSnapshot};

/// A [`SensorRegistry`] that can be written by a sampler and read by a
/// consumer running on another task or thread.
///
/// Every operation runs inside one critical section, so appending a reading
/// (and evicting the oldest) is atomic with respect to snapshot reads.
/// Readers only ever get owned copies.
pub struct SharedRegistry {
    inner: Mutex<CriticalSectionRawMutex, RefCell<SensorRegistry>>,
}

impl SharedRegistry {
    pub const fn new(registry: SensorRegistry) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(registry)),
        }
    }

    /// Run `f` with exclusive access to the registry.
    ///
    /// `f` must not call back into the same `SharedRegistry`.
    pub fn with<R>(&self, f: impl FnOnce(&mut SensorRegistry) -> R) -> R {
        self.inner.lock(|registry| f(&mut registry.borrow_mut()))
    }

    pub fn process_reading(
        &self,
        id: ChannelId,
        value: f32,
        timestamp: u32,
    ) -> Result<Outcome, FilterError> {
        self.with(|registry| registry.process_reading(id, value, timestamp))
    }

    pub fn record_read_failure(&self, id: ChannelId, timestamp: u32) -> Result<(), FilterError> {
        self.with(|registry| registry.record_read_failure(id, timestamp))
    }

    pub fn rearm(&self, id: ChannelId, timestamp: u32) -> Result<(), FilterError> {
        self.with(|registry| registry.rearm(id, timestamp))
    }

    pub fn snapshot(&self, id: ChannelId) -> Result<ChannelSnapshot, FilterError> {
        self.with(|registry| registry.snapshot(id))
    }

    pub fn snapshot_all(&self) -> MeasurementsSnapshot {
        self.with(|registry| registry.snapshot_all())
    }

    pub fn history_snapshot(&self) -> Vec<FilterEvent> {
        self.with(|registry| registry.history_snapshot())
    }
}
