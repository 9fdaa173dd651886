//! Sensor registry: owner of all channel state
//!
//! The registry maps each registered [`ChannelId`] to its [`Channel`] and
//! records every filter event in a bounded [`EventHistory`]. It is passed
//! explicitly to whoever feeds or reads it; wrap it in a [`SharedRegistry`]
//! when a reader runs on another thread or task than the sampler.

mod shared;

pub use shared::*;

use alloc::vec::Vec;

use log::error;

use crate::config::{ChannelConfig, ConfigError, FilterConfig};
use crate::filter::{Channel, FilterError, Outcome};
use crate::history::{EventHistory, EventKind, FilterEvent};
use crate::sensors::ChannelId;
use crate::storage::{ChannelSnapshot, MeasurementsSnapshot};

/// One slot per [`ChannelId`], so registration can only fail on a duplicate.
pub const MAX_CHANNELS: usize = ChannelId::ALL.len();

#[derive(Debug)]
pub struct SensorRegistry {
    channels: [Option<Channel>; MAX_CHANNELS],
    history: EventHistory,
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self {
            channels: [const { None }; MAX_CHANNELS],
            history: EventHistory::new(),
        }
    }

    /// Build a registry with every channel of a validated configuration.
    pub fn from_config(config: &FilterConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for entry in &config.channels {
            registry.register(entry.channel, entry.config)?;
        }
        Ok(registry)
    }

    /// Register a channel in the `Stabilizing` state.
    pub fn register(&mut self, id: ChannelId, config: ChannelConfig) -> Result<(), ConfigError> {
        config.validate(id).inspect_err(|e| error!("Rejected channel config: {}", e))?;
        let slot = &mut self.channels[id.index()];
        if slot.is_some() {
            return Err(ConfigError::DuplicateChannel(id));
        }
        *slot = Some(Channel::new(id, config));
        Ok(())
    }

    /// Run a raw sample through the channel's filter.
    pub fn process_reading(
        &mut self,
        id: ChannelId,
        value: f32,
        timestamp: u32,
    ) -> Result<Outcome, FilterError> {
        let result = self.channel_mut(id)?.process_reading(value, timestamp);

        let kind = match result {
            Ok(outcome) => EventKind::Decision {
                decision: outcome.decision,
                value,
            },
            Err(_) => EventKind::MalformedSample,
        };
        self.history.record(FilterEvent {
            channel: id,
            timestamp,
            kind,
        });

        result
    }

    /// Count a failed sensor read. The filter itself is not invoked.
    pub fn record_read_failure(&mut self, id: ChannelId, timestamp: u32) -> Result<(), FilterError> {
        self.channel_mut(id)?.record_read_failure();
        self.history.record(FilterEvent {
            channel: id,
            timestamp,
            kind: EventKind::ReadFailure,
        });
        Ok(())
    }

    /// Put a channel back into the `Stabilizing` state.
    pub fn rearm(&mut self, id: ChannelId, timestamp: u32) -> Result<(), FilterError> {
        self.channel_mut(id)?.rearm();
        self.history.record(FilterEvent {
            channel: id,
            timestamp,
            kind: EventKind::Rearmed,
        });
        Ok(())
    }

    pub fn channel(&self, id: ChannelId) -> Result<&Channel, FilterError> {
        self.channels[id.index()]
            .as_ref()
            .ok_or_else(|| unknown_channel(id))
    }

    fn channel_mut(&mut self, id: ChannelId) -> Result<&mut Channel, FilterError> {
        self.channels[id.index()]
            .as_mut()
            .ok_or_else(|| unknown_channel(id))
    }

    /// Registered channels, in [`ChannelId::ALL`] order
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().flatten()
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn snapshot(&self, id: ChannelId) -> Result<ChannelSnapshot, FilterError> {
        self.channel(id).map(ChannelSnapshot::from)
    }

    pub fn snapshot_all(&self) -> MeasurementsSnapshot {
        MeasurementsSnapshot {
            channels: self.channels().map(ChannelSnapshot::from).collect(),
        }
    }

    pub fn history_snapshot(&self) -> Vec<FilterEvent> {
        self.history.iter().copied().collect()
    }
}

fn unknown_channel(id: ChannelId) -> FilterError {
    error!("{:?} is not registered", id);
    FilterError::UnknownChannel(id)
}
