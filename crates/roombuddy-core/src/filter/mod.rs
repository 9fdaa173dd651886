//! Per-channel stabilization and change-detection filter
//!
//! Every raw sample goes through three gates, in order:
//!
//! 1. **Range check**: values outside the channel's physical range are
//!    rejected and counted as bad. Nothing else is touched.
//! 2. **Stabilization**: after power-up a sensor drifts. Until
//!    `stabilize_count` consecutive samples stay within `tolerance` of a
//!    running reference, nothing is buffered.
//! 3. **Change detection**: once stabilized, a sample is buffered only if the
//!    buffer is empty or it moved more than `tolerance` away from the last
//!    buffered value.
//!
//! ```text
//!            in range, within tolerance, counter hits 0
//! Stabilizing ───────────────────────────────────────────▶ Stabilized
//!      ▲                                                       │
//!      └──────────────────── rearm() (external) ───────────────┘
//! ```

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::config::ChannelConfig;
use crate::sensors::ChannelId;
use crate::storage::{Reading, ReadingBuffer};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown channel {0:?}")]
    UnknownChannel(ChannelId),
    #[error("{0:?}: malformed sample (not a finite number)")]
    MalformedSample(ChannelId),
}

/// What the filter did with a sample.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Recorded into the channel's buffer
    Accepted,
    /// Sensor healthy but the value did not move beyond the tolerance
    SkippedTolerance,
    /// Channel still waiting for the sensor to settle
    SkippedStabilizing,
    /// Outside the channel's physical range
    RejectedRange,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::SkippedTolerance => "skipped-tolerance",
            Self::SkippedStabilizing => "skipped-stabilizing",
            Self::RejectedRange => "rejected-range",
        }
    }
}

/// A decision together with the channel's counters right after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub decision: Decision,
    pub stabilized: bool,
    pub good_count: u32,
    pub bad_count: u32,
}

/// Mutable filter state of one channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    /// Value the stabilization streak is measured against
    reference: Option<f32>,
    /// In-tolerance samples still required before the channel is stabilized
    stabilization_counter: u32,
    stabilized: bool,
    good_count: u32,
    bad_count: u32,
    error_count: u32,
}

impl ChannelState {
    pub fn reference(&self) -> Option<f32> {
        self.reference
    }

    pub fn stabilization_counter(&self) -> u32 {
        self.stabilization_counter
    }

    pub fn is_stabilized(&self) -> bool {
        self.stabilized
    }

    /// In-range samples seen after stabilization
    pub fn good_count(&self) -> u32 {
        self.good_count
    }

    /// Out-of-range samples
    pub fn bad_count(&self) -> u32 {
        self.bad_count
    }

    /// Sensor I/O failures and malformed samples
    pub fn error_count(&self) -> u32 {
        self.error_count
    }
}

/// A measurement channel: its configuration, filter state and buffer.
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    config: ChannelConfig,
    state: ChannelState,
    buffer: ReadingBuffer,
}

impl Channel {
    /// Create a channel in the `Stabilizing` state with an empty buffer.
    ///
    /// `config` is expected to have passed [`ChannelConfig::validate`].
    pub fn new(id: ChannelId, config: ChannelConfig) -> Self {
        Self {
            id,
            config,
            state: ChannelState::default(),
            buffer: ReadingBuffer::new(config.capacity),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn buffer(&self) -> &ReadingBuffer {
        &self.buffer
    }

    pub fn is_stabilized(&self) -> bool {
        self.state.stabilized
    }

    /// Run one raw sample through the filter.
    ///
    /// Non-finite values are reported as [`FilterError::MalformedSample`] and
    /// only bump the error tally.
    pub fn process_reading(&mut self, value: f32, timestamp: u32) -> Result<Outcome, FilterError> {
        if !value.is_finite() {
            self.state.error_count = self.state.error_count.saturating_add(1);
            warn!("{:?}: discarding malformed sample {}", self.id, value);
            return Err(FilterError::MalformedSample(self.id));
        }

        let decision = if !self.config.contains(value) {
            self.state.bad_count = self.state.bad_count.saturating_add(1);
            Decision::RejectedRange
        } else if !self.state.stabilized {
            self.advance_stabilization(value)
        } else {
            self.detect_change(value, timestamp)
        };

        self.log_decision(decision, value, timestamp);
        Ok(self.outcome(decision))
    }

    /// Count a failed sensor read against this channel.
    pub fn record_read_failure(&mut self) {
        self.state.error_count = self.state.error_count.saturating_add(1);
    }

    /// Return to `Stabilizing`, e.g. after the sensor was power-cycled.
    ///
    /// Buffered readings and counters are kept.
    pub fn rearm(&mut self) {
        self.state.reference = None;
        self.state.stabilization_counter = 0;
        self.state.stabilized = false;
        info!("{:?}: stabilization re-armed", self.id);
    }

    fn advance_stabilization(&mut self, value: f32) -> Decision {
        let tolerance = self.config.tolerance;
        match self.state.reference {
            Some(reference) if (value - reference).abs() <= tolerance => {
                self.state.stabilization_counter = self.state.stabilization_counter.saturating_sub(1);
            }
            _ => {
                // The reference sample is the first of the streak.
                self.state.reference = Some(value);
                self.state.stabilization_counter = self.config.stabilize_count.saturating_sub(1);
            }
        }

        if self.state.stabilization_counter == 0 {
            self.state.stabilized = true;
            info!("{:?}: sensor stabilized, starting measurements", self.id);
        } else {
            debug!(
                "{:?}: waiting for sensor stabilization... {}",
                self.id, self.state.stabilization_counter
            );
        }
        Decision::SkippedStabilizing
    }

    fn detect_change(&mut self, value: f32, timestamp: u32) -> Decision {
        self.state.good_count = self.state.good_count.saturating_add(1);

        let changed = match self.buffer.latest() {
            Some(last) => (value - last.value).abs() > self.config.tolerance,
            None => true,
        };

        if changed {
            self.buffer.push(Reading::new(value, timestamp));
            Decision::Accepted
        } else {
            Decision::SkippedTolerance
        }
    }

    fn log_decision(&self, decision: Decision, value: f32, timestamp: u32) {
        let unit = self.config.unit.symbol();
        match decision {
            Decision::Accepted => info!("{:?}: recorded {}{} at {}", self.id, value, unit, timestamp),
            Decision::SkippedTolerance => {
                debug!("{:?}: skipped {}{}, within tolerance", self.id, value, unit)
            }
            Decision::SkippedStabilizing => {}
            Decision::RejectedRange => warn!(
                "{:?}: rejected {}{}, outside [{}, {}]",
                self.id, value, unit, self.config.min, self.config.max
            ),
        }
    }

    fn outcome(&self, decision: Decision) -> Outcome {
        Outcome {
            decision,
            stabilized: self.state.stabilized,
            good_count: self.state.good_count,
            bad_count: self.state.bad_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::Unit;
    use alloc::vec::Vec;

    fn test_config() -> ChannelConfig {
        ChannelConfig {
            unit: Unit::Celsius,
            min: -40.0,
            max: 80.0,
            tolerance: 0.5,
            stabilize_count: 3,
            capacity: 10,
        }
    }

    fn feed(channel: &mut Channel, values: &[f32]) -> Vec<Decision> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| channel.process_reading(v, i as u32).unwrap().decision)
            .collect()
    }

    fn stabilized_channel(config: ChannelConfig) -> Channel {
        let mut channel = Channel::new(ChannelId::Dht22Temperature, config);
        for _ in 0..config.stabilize_count {
            channel.process_reading(20.0, 0).unwrap();
        }
        assert!(channel.is_stabilized());
        channel
    }

    #[test]
    fn test_stabilizes_then_accepts_first_sample() {
        let mut channel = Channel::new(ChannelId::Dht22Temperature, test_config());

        let decisions = feed(&mut channel, &[20.0, 20.1, 20.2]);
        assert_eq!(decisions, [Decision::SkippedStabilizing; 3]);
        assert!(channel.is_stabilized());
        assert!(channel.buffer().is_empty());

        let outcome = channel.process_reading(20.1, 4).unwrap();
        assert_eq!(
            outcome,
            Outcome {
                decision: Decision::Accepted,
                stabilized: true,
                good_count: 1,
                bad_count: 0,
            }
        );
        assert_eq!(channel.buffer().to_vec(), [Reading::new(20.1, 4)]);

        // |20.3 - 20.1| <= 0.5
        let outcome = channel.process_reading(20.3, 5).unwrap();
        assert_eq!(outcome.decision, Decision::SkippedTolerance);
        assert_eq!(outcome.good_count, 2);
        assert_eq!(channel.buffer().to_vec(), [Reading::new(20.1, 4)]);

        let outcome = channel.process_reading(90.0, 6).unwrap();
        assert_eq!(outcome.decision, Decision::RejectedRange);
        assert_eq!(outcome.bad_count, 1);
        assert!(outcome.stabilized);
        assert_eq!(channel.buffer().len(), 1);
    }

    #[test]
    fn test_drift_restarts_stabilization() {
        let mut channel = Channel::new(ChannelId::Dht22Temperature, test_config());

        feed(&mut channel, &[20.0, 20.1]);
        assert_eq!(channel.state().stabilization_counter(), 1);

        // Real change: new reference, full streak required again
        feed(&mut channel, &[21.0]);
        assert_eq!(channel.state().reference(), Some(21.0));
        assert_eq!(channel.state().stabilization_counter(), 2);
        assert!(!channel.is_stabilized());

        feed(&mut channel, &[21.2, 20.8]);
        assert!(channel.is_stabilized());
    }

    #[test]
    fn test_streak_measured_against_reference_not_previous_sample() {
        let mut channel = Channel::new(ChannelId::Dht22Temperature, test_config());

        // Each step is 0.4, but 20.8 is 0.8 away from the reference 20.0
        feed(&mut channel, &[20.0, 20.4, 20.8]);
        assert!(!channel.is_stabilized());
        assert_eq!(channel.state().reference(), Some(20.8));
    }

    #[test]
    fn test_range_rejection_does_not_touch_stabilization() {
        let mut channel = Channel::new(ChannelId::Dht22Temperature, test_config());

        feed(&mut channel, &[20.0]);
        let before = channel.state().clone();

        let outcome = channel.process_reading(-41.0, 1).unwrap();
        assert_eq!(outcome.decision, Decision::RejectedRange);
        assert!(!outcome.stabilized);
        assert_eq!(channel.state().reference(), before.reference());
        assert_eq!(
            channel.state().stabilization_counter(),
            before.stabilization_counter()
        );
        assert_eq!(channel.state().bad_count(), 1);
        assert_eq!(channel.state().good_count(), 0);
    }

    #[test]
    fn test_repeated_identical_sample_accepted_once() {
        let mut channel = stabilized_channel(test_config());

        let decisions = feed(&mut channel, &[22.0; 6]);
        assert_eq!(decisions[0], Decision::Accepted);
        assert!(decisions[1..].iter().all(|d| *d == Decision::SkippedTolerance));
        assert_eq!(channel.buffer().len(), 1);
        assert_eq!(channel.state().good_count(), 6);
    }

    #[test]
    fn test_buffered_values_differ_by_more_than_tolerance() {
        let config = ChannelConfig {
            capacity: 5,
            ..test_config()
        };
        let mut channel = stabilized_channel(config);

        let samples = [20.0, 20.3, 20.6, 20.9, 21.2, 19.0, 19.4, 25.0, 25.5, 26.1, 30.0];
        feed(&mut channel, &samples);

        let buffered = channel.buffer().to_vec();
        assert!(buffered.len() <= config.capacity);
        for pair in buffered.windows(2) {
            assert!((pair[1].value - pair[0].value).abs() > config.tolerance);
        }
    }

    #[test]
    fn test_capacity_two_evicts_oldest() {
        let config = ChannelConfig {
            capacity: 2,
            ..test_config()
        };
        let mut channel = stabilized_channel(config);

        let decisions = feed(&mut channel, &[20.1, 21.0, 22.0]);
        assert_eq!(decisions, [Decision::Accepted; 3]);

        let values: Vec<f32> = channel.buffer().iter().map(|r| r.value).collect();
        assert_eq!(values, [21.0, 22.0]);
    }

    #[test]
    fn test_stabilize_count_of_one() {
        let config = ChannelConfig {
            stabilize_count: 1,
            ..test_config()
        };
        let mut channel = Channel::new(ChannelId::Dht22Temperature, config);

        assert_eq!(feed(&mut channel, &[20.0]), [Decision::SkippedStabilizing]);
        assert!(channel.is_stabilized());
        assert_eq!(feed(&mut channel, &[20.0]), [Decision::Accepted]);
    }

    #[test]
    fn test_malformed_sample_is_counted_separately() {
        let mut channel = stabilized_channel(test_config());
        let before = channel.state().clone();

        assert_eq!(
            channel.process_reading(f32::NAN, 1),
            Err(FilterError::MalformedSample(ChannelId::Dht22Temperature))
        );
        assert_eq!(
            channel.process_reading(f32::INFINITY, 2),
            Err(FilterError::MalformedSample(ChannelId::Dht22Temperature))
        );

        assert_eq!(channel.state().error_count(), 2);
        assert_eq!(channel.state().good_count(), before.good_count());
        assert_eq!(channel.state().bad_count(), before.bad_count());
        assert!(channel.buffer().is_empty());
    }

    #[test]
    fn test_rearm_keeps_buffer() {
        let mut channel = stabilized_channel(test_config());
        feed(&mut channel, &[23.0]);

        channel.rearm();
        assert!(!channel.is_stabilized());
        assert_eq!(channel.buffer().len(), 1);

        assert_eq!(
            feed(&mut channel, &[23.0, 23.0, 23.0]),
            [Decision::SkippedStabilizing; 3]
        );
        assert!(channel.is_stabilized());
        // Change detection continues against the kept buffer
        assert_eq!(feed(&mut channel, &[23.1]), [Decision::SkippedTolerance]);
    }
}
