use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use super::Reading;
use crate::filter::Channel;
use crate::sensors::{ChannelId, Unit};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("snapshot encoding failed: {0}")]
    Encode(postcard::Error),
    #[error("snapshot decoding failed: {0}")]
    Decode(postcard::Error),
}

/// Point-in-time copy of one channel, for consumers outside the sampler.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelSnapshot {
    pub channel: ChannelId,
    pub unit: Unit,
    pub stabilized: bool,
    pub good_count: u32,
    pub bad_count: u32,
    pub error_count: u32,
    /// Oldest to newest
    pub readings: Vec<Reading>,
}

impl From<&Channel> for ChannelSnapshot {
    fn from(channel: &Channel) -> Self {
        let state = channel.state();
        Self {
            channel: channel.id(),
            unit: channel.config().unit,
            stabilized: state.is_stabilized(),
            good_count: state.good_count(),
            bad_count: state.bad_count(),
            error_count: state.error_count(),
            readings: channel.buffer().to_vec(),
        }
    }
}

impl ChannelSnapshot {
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }
}

/// Snapshot of every registered channel.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MeasurementsSnapshot {
    pub channels: Vec<ChannelSnapshot>,
}

impl MeasurementsSnapshot {
    pub fn channel(&self, id: ChannelId) -> Option<&ChannelSnapshot> {
        self.channels.iter().find(|c| c.channel == id)
    }

    /// Compact binary encoding for shipping the snapshot off-device.
    pub fn to_postcard(&self) -> Result<Vec<u8>, ExportError> {
        postcard::to_allocvec(self).map_err(ExportError::Encode)
    }

    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ExportError> {
        postcard::from_bytes(bytes).map_err(ExportError::Decode)
    }
}
