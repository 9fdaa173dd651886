//! Periodic sensor polling
//!
//! A [`Sampler`] owns one sensor and feeds every reading it produces into the
//! shared registry, one channel per value. The caller decides the cadence:
//! a hardware timer on the device, a sleep loop on the host.

use log::{error, info, warn};

use crate::filter::{FilterError, Outcome};
use crate::registry::SharedRegistry;
use crate::sensors::{Sensor, SensorError, SensorReadings};

/// Result of one poll: the filter result for each of the sensor's channels,
/// in [`Sensor::CHANNELS`] order.
pub type PollResults<const COUNT: usize> = [Result<Outcome, FilterError>; COUNT];

pub struct Sampler<'r, S, const COUNT: usize>
where
    S: Sensor<COUNT>,
{
    sensor: S,
    registry: &'r SharedRegistry,
    consecutive_failures: u32,
    /// Treat a recovery after this many failed reads as a power cycle
    rearm_after_failures: Option<u32>,
}

impl<'r, S, const COUNT: usize> Sampler<'r, S, COUNT>
where
    S: Sensor<COUNT>,
{
    pub fn new(sensor: S, registry: &'r SharedRegistry, rearm_after_failures: Option<u32>) -> Self {
        Self {
            sensor,
            registry,
            consecutive_failures: 0,
            rearm_after_failures,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Read the sensor once and run every value through the filter.
    ///
    /// A failed read is counted on each of the sensor's channels and returned;
    /// the filter is not invoked and no channel state changes.
    pub async fn poll(&mut self, timestamp: u32) -> Result<PollResults<COUNT>, SensorError> {
        let readings = match self.sensor.read().await {
            Ok(readings) => readings,
            Err(e) => {
                warn!("Error reading sensor [{}]: {}", S::NAME, e);
                self.record_failure(timestamp);
                return Err(e);
            }
        };

        if self.should_rearm() {
            info!(
                "[{}] recovered after {} failed reads, re-arming stabilization",
                S::NAME,
                self.consecutive_failures
            );
            self.rearm(timestamp);
        }
        self.consecutive_failures = 0;

        let values = readings.to_array();
        Ok(core::array::from_fn(|i| {
            self.registry
                .process_reading(S::CHANNELS[i], values[i], timestamp)
        }))
    }

    /// Put every channel of this sensor back into the `Stabilizing` state.
    pub fn rearm(&self, timestamp: u32) {
        for channel in S::CHANNELS {
            if let Err(e) = self.registry.rearm(channel, timestamp) {
                error!("[{}] cannot re-arm: {}", S::NAME, e);
            }
        }
    }

    fn record_failure(&mut self, timestamp: u32) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        for channel in S::CHANNELS {
            if let Err(e) = self.registry.record_read_failure(channel, timestamp) {
                error!("[{}] cannot record read failure: {}", S::NAME, e);
            }
        }
    }

    fn should_rearm(&self) -> bool {
        match self.rearm_after_failures {
            Some(limit) => limit > 0 && self.consecutive_failures >= limit,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::filter::Decision;
    use crate::registry::SensorRegistry;
    use crate::sensors::{ChannelId, DHT22_CHANNELS, Dht22Readings};
    use alloc::collections::VecDeque;
    use embassy_futures::block_on;

    /// Replays a fixed script of frames, as a DHT22 on the bus would.
    struct ScriptedDht22 {
        frames: VecDeque<Result<[u8; 5], SensorError>>,
    }

    impl ScriptedDht22 {
        fn new(script: impl IntoIterator<Item = Result<(f32, f32), SensorError>>) -> Self {
            let frames = script
                .into_iter()
                .map(|r| {
                    r.map(|(temperature_celsius, humidity_percent)| {
                        Dht22Readings {
                            temperature_celsius,
                            humidity_percent,
                        }
                        .to_frame()
                    })
                })
                .collect();
            Self { frames }
        }
    }

    impl Sensor<2> for ScriptedDht22 {
        type Readings = Dht22Readings;
        const NAME: &'static str = "DHT22";
        const CHANNELS: [ChannelId; 2] = DHT22_CHANNELS;

        async fn read(&mut self) -> Result<Dht22Readings, SensorError> {
            let frame = self.frames.pop_front().unwrap_or(Err(TIMEOUT))?;
            Dht22Readings::from_frame(frame)
        }
    }

    const TIMEOUT: SensorError = SensorError::Timeout {
        sensor: "DHT22",
        operation: "wait for response",
    };

    fn registry() -> SharedRegistry {
        let mut registry = SensorRegistry::new();
        for id in DHT22_CHANNELS {
            let config = ChannelConfig {
                stabilize_count: 2,
                ..ChannelConfig::preset(id)
            };
            registry.register(id, config).unwrap();
        }
        SharedRegistry::new(registry)
    }

    fn decisions(results: PollResults<2>) -> [Decision; 2] {
        results.map(|r| r.unwrap().decision)
    }

    #[test]
    fn test_poll_feeds_each_channel() {
        let registry = registry();
        let sensor = ScriptedDht22::new([Ok((21.0, 40.0)), Ok((21.0, 40.0)), Ok((21.2, 45.0))]);
        let mut sampler = Sampler::new(sensor, &registry, None);

        let first = block_on(sampler.poll(1)).unwrap();
        assert_eq!(decisions(first), [Decision::SkippedStabilizing; 2]);
        block_on(sampler.poll(3)).unwrap();

        let third = block_on(sampler.poll(5)).unwrap();
        assert_eq!(decisions(third), [Decision::Accepted; 2]);

        let humidity = registry.snapshot(ChannelId::Dht22Humidity).unwrap();
        assert_eq!(humidity.latest().map(|r| (r.value, r.timestamp)), Some((45.0, 5)));
    }

    #[test]
    fn test_failed_read_leaves_state_alone() {
        let registry = registry();
        let sensor = ScriptedDht22::new([Ok((21.0, 40.0)), Err(TIMEOUT), Ok((21.0, 40.0))]);
        let mut sampler = Sampler::new(sensor, &registry, None);

        block_on(sampler.poll(1)).unwrap();
        let before = registry.snapshot(ChannelId::Dht22Temperature).unwrap();

        assert_eq!(block_on(sampler.poll(3)), Err(TIMEOUT));
        assert_eq!(sampler.consecutive_failures(), 1);

        let after = registry.snapshot(ChannelId::Dht22Temperature).unwrap();
        assert_eq!(after.error_count, 1);
        assert_eq!(after.stabilized, before.stabilized);
        assert_eq!(after.readings, before.readings);

        // The failure does not break the stabilization streak
        block_on(sampler.poll(5)).unwrap();
        assert!(registry.snapshot(ChannelId::Dht22Temperature).unwrap().stabilized);
        assert_eq!(sampler.consecutive_failures(), 0);
    }

    #[test]
    fn test_checksum_error_is_a_read_failure() {
        let registry = registry();
        let sensor = ScriptedDht22 {
            frames: VecDeque::from([Ok([0x02, 0x8C, 0x01, 0x5F, 0x00])]),
        };
        let mut sampler = Sampler::new(sensor, &registry, None);

        assert!(matches!(
            block_on(sampler.poll(1)),
            Err(SensorError::Checksum { .. })
        ));
        let humidity = registry.snapshot(ChannelId::Dht22Humidity).unwrap();
        assert_eq!(humidity.error_count, 1);
    }

    #[test]
    fn test_recovery_after_outage_rearms() {
        let registry = registry();
        let sensor = ScriptedDht22::new([
            Ok((21.0, 40.0)),
            Ok((21.0, 40.0)),
            Err(TIMEOUT),
            Err(TIMEOUT),
            Ok((21.0, 40.0)),
        ]);
        let mut sampler = Sampler::new(sensor, &registry, Some(2));

        block_on(sampler.poll(1)).unwrap();
        block_on(sampler.poll(3)).unwrap();
        assert!(registry.snapshot(ChannelId::Dht22Temperature).unwrap().stabilized);

        block_on(sampler.poll(5)).unwrap_err();
        block_on(sampler.poll(7)).unwrap_err();

        let results = block_on(sampler.poll(9)).unwrap();
        assert_eq!(decisions(results), [Decision::SkippedStabilizing; 2]);
        assert!(!registry.snapshot(ChannelId::Dht22Temperature).unwrap().stabilized);
    }

    #[test]
    fn test_short_outage_does_not_rearm() {
        let registry = registry();
        let sensor = ScriptedDht22::new([
            Ok((21.0, 40.0)),
            Ok((21.0, 40.0)),
            Err(TIMEOUT),
            Ok((21.0, 40.0)),
        ]);
        let mut sampler = Sampler::new(sensor, &registry, Some(2));

        block_on(sampler.poll(1)).unwrap();
        block_on(sampler.poll(3)).unwrap();
        block_on(sampler.poll(5)).unwrap_err();

        let results = block_on(sampler.poll(7)).unwrap();
        assert_eq!(decisions(results), [Decision::Accepted; 2]);
    }
}
