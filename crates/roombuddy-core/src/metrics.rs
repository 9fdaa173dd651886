//! Metrics and quality assessment for sensor data
//!
//! This module provides quality level assessment and thresholds for
//! determining environmental quality based on sensor readings, and the
//! status LED colour derived from it.

use crate::registry::SensorRegistry;
use crate::sensors::Quantity;

/// Quality level assessment for sensor readings
///
/// Ordered from best to worst, so the worst of several levels is their `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityLevel {
    /// Optimal conditions
    Excellent,
    /// Acceptable conditions
    Good,
    /// Sub-optimal conditions
    Poor,
    /// Problematic conditions
    Bad,
}

/// PWM duty of each colour of an RGB LED, 0 (off) to 255 (full).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedColor {
    pub const OFF: Self = Self::new(0, 0, 0);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const ORANGE: Self = Self::new(255, 96, 0);
    pub const LIGHT_GREEN: Self = Self::new(96, 255, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl QualityLevel {
    /// Assess quality level for a given sensor reading
    ///
    /// Thresholds are based on common indoor comfort ranges.
    /// Values are in the channel's unit (°C, %, Pa).
    pub fn assess(quantity: Quantity, value: f32) -> Self {
        match quantity {
            Quantity::Temperature => {
                // Excellent: 20-24°C (comfortable indoor range)
                // Good: 18-26°C (acceptable range)
                // Poor: 15-28°C (uncomfortable but tolerable)
                if (20.0..=24.0).contains(&value) {
                    Self::Excellent
                } else if (18.0..=26.0).contains(&value) {
                    Self::Good
                } else if (15.0..=28.0).contains(&value) {
                    Self::Poor
                } else {
                    Self::Bad
                }
            }
            Quantity::Humidity => {
                // Excellent: 40-60% (optimal indoor humidity)
                // Good: 30-70% (acceptable range)
                // Poor: 20-80% (uncomfortable but tolerable)
                if (40.0..=60.0).contains(&value) {
                    Self::Excellent
                } else if (30.0..=70.0).contains(&value) {
                    Self::Good
                } else if (20.0..=80.0).contains(&value) {
                    Self::Poor
                } else {
                    Self::Bad
                }
            }
            Quantity::Pressure => {
                // Distance from standard sea-level pressure (101325 Pa).
                // Large deviations come with passing weather fronts.
                let deviation = (value - 101_325.0).abs();
                if deviation <= 1_000.0 {
                    Self::Excellent
                } else if deviation <= 2_000.0 {
                    Self::Good
                } else if deviation <= 3_500.0 {
                    Self::Poor
                } else {
                    Self::Bad
                }
            }
        }
    }

    /// Worst quality across the latest buffered value of every stabilized
    /// channel, or `None` while nothing has been recorded yet.
    pub fn assess_registry(registry: &SensorRegistry) -> Option<Self> {
        registry
            .channels()
            .filter(|channel| channel.is_stabilized())
            .filter_map(|channel| {
                channel
                    .buffer()
                    .latest()
                    .map(|reading| Self::assess(channel.id().quantity(), reading.value))
            })
            .max()
    }

    /// Colour shown on the info LED for this quality level
    pub const fn led_color(self) -> LedColor {
        match self {
            Self::Excellent => LedColor::GREEN,
            Self::Good => LedColor::LIGHT_GREEN,
            Self::Poor => LedColor::ORANGE,
            Self::Bad => LedColor::RED,
        }
    }

    /// Get the display label for this quality level
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Poor => "Poor",
            Self::Bad => "Bad",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::sensors::ChannelId;

    #[test]
    fn test_assess_thresholds() {
        assert_eq!(QualityLevel::assess(Quantity::Temperature, 22.0), QualityLevel::Excellent);
        assert_eq!(QualityLevel::assess(Quantity::Temperature, 25.0), QualityLevel::Good);
        assert_eq!(QualityLevel::assess(Quantity::Humidity, 75.0), QualityLevel::Poor);
        assert_eq!(QualityLevel::assess(Quantity::Humidity, 12.0), QualityLevel::Bad);
        assert_eq!(QualityLevel::assess(Quantity::Pressure, 101_000.0), QualityLevel::Excellent);
        assert_eq!(QualityLevel::assess(Quantity::Pressure, 96_000.0), QualityLevel::Bad);
    }

    #[test]
    fn test_registry_reports_worst_stabilized_channel() {
        let mut registry = SensorRegistry::new();
        for id in [ChannelId::Dht22Temperature, ChannelId::Dht22Humidity] {
            let config = ChannelConfig {
                stabilize_count: 1,
                ..ChannelConfig::preset(id)
            };
            registry.register(id, config).unwrap();
        }
        assert_eq!(QualityLevel::assess_registry(&registry), None);

        for ts in 0..2 {
            registry.process_reading(ChannelId::Dht22Temperature, 22.0, ts).unwrap();
        }
        assert_eq!(
            QualityLevel::assess_registry(&registry),
            Some(QualityLevel::Excellent)
        );

        for ts in 0..2 {
            registry.process_reading(ChannelId::Dht22Humidity, 75.0, ts).unwrap();
        }
        let worst = QualityLevel::assess_registry(&registry).unwrap();
        assert_eq!(worst, QualityLevel::Poor);
        assert_eq!(worst.led_color(), LedColor::ORANGE);
    }
}
