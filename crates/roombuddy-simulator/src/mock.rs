//! Synthetic DHT22 and BMP280 sensors.
//!
//! Values follow slow sinusoids so the filter sees both drift and plateaus.
//! Both sensors also misbehave on a fixed schedule, the way the real parts do
//! on a long breadboard lead: corrupted frames, unacknowledged bus transfers,
//! implausible spikes and, for the DHT22, a short outage that looks like a
//! power cycle.

use roombuddy_core::sensors::{
    BMP280_CHANNELS, Bmp280Readings, ChannelId, DHT22_CHANNELS, Dht22Readings, Sensor, SensorError,
};

/// Every n-th DHT22 frame arrives with a flipped checksum bit.
const DHT22_CHECKSUM_GLITCH_EVERY: u32 = 29;
/// Every n-th DHT22 read reports an impossible temperature.
const DHT22_SPIKE_EVERY: u32 = 47;
/// Reads during which the DHT22 does not answer at all.
const DHT22_OUTAGE: core::ops::Range<u32> = 150..155;
/// Every n-th BMP280 read reports an impossible pressure.
const BMP280_SPIKE_EVERY: u32 = 53;
/// Every n-th BMP280 transfer is not acknowledged on the I2C bus.
const BMP280_NACK_EVERY: u32 = 71;

pub struct MockDht22 {
    /// Seconds of simulated time, advanced by one interval per read
    elapsed_secs: f64,
    interval_secs: f64,
    reads: u32,
}

impl MockDht22 {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            elapsed_secs: 0.0,
            interval_secs,
            reads: 0,
        }
    }

    fn next_readings(&mut self) -> Dht22Readings {
        self.elapsed_secs += self.interval_secs;
        let t = self.elapsed_secs;

        // Temperature: 20–26 °C sinusoidal with slow drift
        let temperature = 23.0 + 3.0 * (t / 600.0).sin() + 0.2 * (t / 37.0).cos();
        // Humidity: 40–60 % with a different period
        let humidity = 50.0 + 10.0 * (t / 900.0).sin() + 1.0 * (t / 23.0).cos();

        Dht22Readings {
            temperature_celsius: temperature as f32,
            humidity_percent: humidity as f32,
        }
    }
}

impl Sensor<2> for MockDht22 {
    type Readings = Dht22Readings;
    const NAME: &'static str = "DHT22";
    const CHANNELS: [ChannelId; 2] = DHT22_CHANNELS;

    async fn read(&mut self) -> Result<Dht22Readings, SensorError> {
        self.reads += 1;

        if DHT22_OUTAGE.contains(&self.reads) {
            return Err(SensorError::Timeout {
                sensor: "DHT22",
                operation: "wait for response",
            });
        }

        let mut readings = self.next_readings();
        if self.reads % DHT22_SPIKE_EVERY == 0 {
            readings.temperature_celsius = 150.0;
        }

        let mut frame = readings.to_frame();
        if self.reads % DHT22_CHECKSUM_GLITCH_EVERY == 0 {
            frame[4] ^= 0x01;
        }

        Dht22Readings::from_frame(frame)
    }
}

pub struct MockBmp280 {
    elapsed_secs: f64,
    interval_secs: f64,
    reads: u32,
}

impl MockBmp280 {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            elapsed_secs: 0.0,
            interval_secs,
            reads: 0,
        }
    }
}

impl Sensor<2> for MockBmp280 {
    type Readings = Bmp280Readings;
    const NAME: &'static str = "BMP280";
    const CHANNELS: [ChannelId; 2] = BMP280_CHANNELS;

    async fn read(&mut self) -> Result<Bmp280Readings, SensorError> {
        self.reads += 1;
        self.elapsed_secs += self.interval_secs;

        if self.reads % BMP280_NACK_EVERY == 0 {
            return Err(SensorError::ReadFailed {
                sensor: "BMP280",
                operation: "read measurement registers",
                details: "no ACK from device",
            });
        }

        let t = self.elapsed_secs;

        let temperature = 22.5 + 2.5 * (t / 700.0).sin();
        let mut pressure = 101_325.0 + 400.0 * (t / 1200.0).sin() + 30.0 * (t / 17.0).cos();
        if self.reads % BMP280_SPIKE_EVERY == 0 {
            pressure = 20_000.0;
        }

        Ok(Bmp280Readings {
            temperature_celsius: temperature as f32,
            pressure_pa: pressure as f32,
        })
    }
}
