//! Channel and filter configuration
//!
//! Presets carry the tolerances and physical ranges of the DHT22 and BMP280
//! as wired on the room-buddy board. A [`FilterConfig`] can also be
//! deserialized (e.g. from a JSON file on the host) and must pass
//! [`FilterConfig::validate`] before a registry is built from it.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::sensors::{ChannelId, Unit};

/// DHT22 supports at most one conversion every two seconds (0.5 Hz).
pub const DHT22_INTERVAL_MS: u32 = 2000;
/// The BMP280 could go up to 157 Hz, which floods the log. Poll it every 2 s.
pub const BMP280_INTERVAL_MS: u32 = 2000;

/// Consecutive in-tolerance samples before a freshly powered sensor is trusted.
pub const DEFAULT_STABILIZE_COUNT: u32 = 10;
/// Readings kept per channel for consumers.
pub const DEFAULT_BUFFER_CAPACITY: usize = 32;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("{channel:?}: invalid range [{min}, {max}]")]
    InvalidRange { channel: ChannelId, min: f32, max: f32 },
    #[error("{channel:?}: tolerance must be finite and non-negative, got {tolerance}")]
    InvalidTolerance { channel: ChannelId, tolerance: f32 },
    #[error("{0:?}: stabilize count must be at least 1")]
    ZeroStabilizeCount(ChannelId),
    #[error("{0:?}: buffer capacity must be at least 1")]
    ZeroCapacity(ChannelId),
    #[error("{0:?} is registered more than once")]
    DuplicateChannel(ChannelId),
}

/// Filter parameters for a single measurement channel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    pub unit: Unit,
    /// Lowest physically plausible value (inclusive)
    pub min: f32,
    /// Highest physically plausible value (inclusive)
    pub max: f32,
    /// Smallest absolute change that counts as a real change
    pub tolerance: f32,
    /// Consecutive samples within `tolerance` of the reference needed to stabilize
    pub stabilize_count: u32,
    /// Maximum number of buffered readings
    pub capacity: usize,
}

impl ChannelConfig {
    /// Default configuration for one of the known channels.
    pub const fn preset(channel: ChannelId) -> Self {
        match channel {
            ChannelId::Dht22Temperature => Self {
                unit: Unit::Celsius,
                min: -40.0,
                max: 80.0,
                tolerance: 0.5,
                stabilize_count: DEFAULT_STABILIZE_COUNT,
                capacity: DEFAULT_BUFFER_CAPACITY,
            },
            ChannelId::Dht22Humidity => Self {
                unit: Unit::Percent,
                min: 0.0,
                max: 100.0,
                tolerance: 2.0,
                stabilize_count: DEFAULT_STABILIZE_COUNT,
                capacity: DEFAULT_BUFFER_CAPACITY,
            },
            ChannelId::Bmp280Temperature => Self {
                unit: Unit::Celsius,
                min: -40.0,
                max: 85.0,
                tolerance: 0.5,
                stabilize_count: DEFAULT_STABILIZE_COUNT,
                capacity: DEFAULT_BUFFER_CAPACITY,
            },
            ChannelId::Bmp280Pressure => Self {
                unit: Unit::Pascal,
                min: 300.0 * 100.0,
                max: 1100.0 * 100.0,
                tolerance: 100.0,
                stabilize_count: DEFAULT_STABILIZE_COUNT,
                capacity: DEFAULT_BUFFER_CAPACITY,
            },
        }
    }

    /// Returns true if `value` lies inside `[min, max]`.
    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Check the invariants the filter relies on.
    pub fn validate(&self, channel: ChannelId) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(ConfigError::InvalidRange {
                channel,
                min: self.min,
                max: self.max,
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance {
                channel,
                tolerance: self.tolerance,
            });
        }
        if self.stabilize_count == 0 {
            return Err(ConfigError::ZeroStabilizeCount(channel));
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity(channel));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ChannelEntry {
    pub channel: ChannelId,
    pub config: ChannelConfig,
}

/// Complete configuration for a registry and its samplers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub channels: Vec<ChannelEntry>,
    /// Re-arm stabilization when a sensor recovers after this many
    /// consecutive read failures. `None` never re-arms.
    #[serde(default)]
    pub rearm_after_failures: Option<u32>,
    #[serde(default = "default_dht22_interval")]
    pub dht22_interval_ms: u32,
    #[serde(default = "default_bmp280_interval")]
    pub bmp280_interval_ms: u32,
}

fn default_dht22_interval() -> u32 {
    DHT22_INTERVAL_MS
}

fn default_bmp280_interval() -> u32 {
    BMP280_INTERVAL_MS
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            channels: ChannelId::ALL
                .iter()
                .map(|&channel| ChannelEntry {
                    channel,
                    config: ChannelConfig::preset(channel),
                })
                .collect(),
            rearm_after_failures: None,
            dht22_interval_ms: DHT22_INTERVAL_MS,
            bmp280_interval_ms: BMP280_INTERVAL_MS,
        }
    }
}

impl FilterConfig {
    /// Validate every channel and reject duplicate registrations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, entry) in self.channels.iter().enumerate() {
            entry.config.validate(entry.channel)?;
            if self.channels[..i].iter().any(|e| e.channel == entry.channel) {
                return Err(ConfigError::DuplicateChannel(entry.channel));
            }
        }
        Ok(())
    }

    pub fn channel(&self, channel: ChannelId) -> Option<&ChannelConfig> {
        self.channels
            .iter()
            .find(|e| e.channel == channel)
            .map(|e| &e.config)
    }
}
