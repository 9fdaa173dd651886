mod bmp280;
mod dht22;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

pub use bmp280::{BMP280_CHANNELS, Bmp280Readings};
pub use dht22::{DHT22_CHANNELS, Dht22Readings};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: {operation} failed ({details})")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor}: checksum mismatch (expected {expected:#04x}, got {actual:#04x})")]
    Checksum {
        sensor: &'static str,
        expected: u8,
        actual: u8,
    },
    #[error("{sensor}: timed out during {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
}

/// Physical quantity measured by a channel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    Humidity,
    Pressure,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Celsius,
    Percent,
    Pascal,
}

impl Unit {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Percent => "%",
            Self::Pascal => "Pa",
        }
    }
}

/// Every measurement channel the firmware knows about.
///
/// Channels are registered at compile time; a sensor binds its readings to
/// channels through [`Sensor::CHANNELS`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Dht22Temperature,
    Dht22Humidity,
    Bmp280Temperature,
    Bmp280Pressure,
}

impl ChannelId {
    pub const ALL: [ChannelId; 4] = [
        Self::Dht22Temperature,
        Self::Dht22Humidity,
        Self::Bmp280Temperature,
        Self::Bmp280Pressure,
    ];

    pub const fn quantity(self) -> Quantity {
        match self {
            Self::Dht22Temperature | Self::Bmp280Temperature => Quantity::Temperature,
            Self::Dht22Humidity => Quantity::Humidity,
            Self::Bmp280Pressure => Quantity::Pressure,
        }
    }

    /// Position in [`ChannelId::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case key, used in dashboard payloads.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Dht22Temperature => "dht22_temperature",
            Self::Dht22Humidity => "dht22_humidity",
            Self::Bmp280Temperature => "bmp280_temperature",
            Self::Bmp280Pressure => "bmp280_pressure",
        }
    }

    /// Name of the sensor that produces this channel.
    pub const fn sensor(self) -> &'static str {
        match self {
            Self::Dht22Temperature | Self::Dht22Humidity => "DHT22",
            Self::Bmp280Temperature | Self::Bmp280Pressure => "BMP280",
        }
    }
}

/// Trait for sensor reading data structures.
/// Provides compile-time guarantees about the number of values and their conversion to arrays.
pub trait SensorReadings<const COUNT: usize> {
    /// Convert the readings into a fixed-size array, ordered like [`Sensor::CHANNELS`].
    fn to_array(self) -> [f32; COUNT];
}

/// Trait for sensors that produce typed readings.
pub trait Sensor<const COUNT: usize> {
    /// The type of readings this sensor produces.
    type Readings: SensorReadings<COUNT>;

    /// Name used in log output.
    const NAME: &'static str;

    /// Channel receiving each value of [`SensorReadings::to_array`], by position.
    const CHANNELS: [ChannelId; COUNT];

    /// Read the sensor and return typed readings.
    fn read(&mut self) -> impl Future<Output = Result<Self::Readings, SensorError>>;
}
