use super::{ChannelId, SensorReadings};

/// Channels fed by a BMP280, in [`Bmp280Readings::to_array`] order.
pub const BMP280_CHANNELS: [ChannelId; 2] =
    [ChannelId::Bmp280Temperature, ChannelId::Bmp280Pressure];

/// Typed readings from the BMP280 sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bmp280Readings {
    pub temperature_celsius: f32,
    pub pressure_pa: f32,
}

impl SensorReadings<2> for Bmp280Readings {
    fn to_array(self) -> [f32; 2] {
        [self.temperature_celsius, self.pressure_pa]
    }
}
