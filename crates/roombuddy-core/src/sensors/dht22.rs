use super::{ChannelId, SensorError, SensorReadings};

/// Channels fed by a DHT22, in [`Dht22Readings::to_array`] order.
pub const DHT22_CHANNELS: [ChannelId; 2] = [ChannelId::Dht22Temperature, ChannelId::Dht22Humidity];

/// Length of a DHT22 transmission: 16 bit humidity, 16 bit temperature, 8 bit checksum.
pub const DHT22_FRAME_LEN: usize = 5;

const SIGN_BIT: u8 = 0x80;

/// Typed readings from the DHT22 sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dht22Readings {
    pub temperature_celsius: f32,
    pub humidity_percent: f32,
}

impl SensorReadings<2> for Dht22Readings {
    fn to_array(self) -> [f32; 2] {
        [self.temperature_celsius, self.humidity_percent]
    }
}

impl Dht22Readings {
    /// Decode the 40 data bits clocked out by the sensor.
    ///
    /// Both values are transmitted in tenths. The temperature uses a sign bit
    /// rather than two's complement.
    pub fn from_frame(frame: [u8; DHT22_FRAME_LEN]) -> Result<Self, SensorError> {
        let expected = checksum(&frame);
        if frame[4] != expected {
            return Err(SensorError::Checksum {
                sensor: "DHT22",
                expected,
                actual: frame[4],
            });
        }

        let humidity = u16::from_be_bytes([frame[0], frame[1]]);
        let magnitude = u16::from_be_bytes([frame[2] & !SIGN_BIT, frame[3]]);

        let mut temperature_celsius = magnitude as f32 / 10.0;
        if frame[2] & SIGN_BIT != 0 {
            // negative temp, brrr it's freezing
            temperature_celsius = -temperature_celsius;
        }

        Ok(Self {
            temperature_celsius,
            humidity_percent: humidity as f32 / 10.0,
        })
    }

    /// Encode readings the way the sensor would transmit them.
    ///
    /// Values are rounded to the nearest tenth. Used to drive the decoder from
    /// simulated hardware.
    pub fn to_frame(self) -> [u8; DHT22_FRAME_LEN] {
        let humidity = tenths(self.humidity_percent);
        let magnitude = tenths(self.temperature_celsius).min(0x7FFF);

        let [h_hi, h_lo] = humidity.to_be_bytes();
        let [t_hi, t_lo] = magnitude.to_be_bytes();
        let t_hi = if self.temperature_celsius < 0.0 && magnitude != 0 {
            t_hi | SIGN_BIT
        } else {
            t_hi
        };

        let mut frame = [h_hi, h_lo, t_hi, t_lo, 0];
        frame[4] = checksum(&frame);
        frame
    }
}

/// Sum of the four data bytes, truncated to 8 bits.
fn checksum(frame: &[u8; DHT22_FRAME_LEN]) -> u8 {
    frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

fn tenths(value: f32) -> u16 {
    let scaled = value.abs() * 10.0 + 0.5;
    if scaled >= u16::MAX as f32 {
        u16::MAX
    } else {
        scaled as u16
    }
}
