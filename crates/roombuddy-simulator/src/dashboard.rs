//! JSON payloads served to the dashboard.
//!
//! The measurements payload keeps the `<series>_timestamps: [[value, iso8601], ...]`
//! shape the web front-end polls for. The DHT22 series keep their historical
//! `temperature` and `humidity` names; BMP280 series are prefixed with the
//! sensor so they do not collide with them.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use roombuddy_core::history::{EventKind, FilterEvent};
use roombuddy_core::sensors::ChannelId;
use roombuddy_core::storage::MeasurementsSnapshot;

/// Format seconds since epoch as `2024-12-15T14:30:00Z`.
pub fn iso_timestamp(timestamp: u32) -> String {
    DateTime::<Utc>::from_timestamp(i64::from(timestamp), 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

fn round2(value: f32) -> f64 {
    (f64::from(value) * 100.0).round() / 100.0
}

/// Series name of a channel in the measurements payload.
fn series_key(channel: ChannelId) -> &'static str {
    match channel {
        ChannelId::Dht22Temperature => "temperature",
        ChannelId::Dht22Humidity => "humidity",
        other => other.key(),
    }
}

pub fn measurements_json(snapshot: &MeasurementsSnapshot) -> Value {
    let mut payload = Map::new();
    for channel in &snapshot.channels {
        let readings = channel
            .readings
            .iter()
            .map(|r| json!([round2(r.value), iso_timestamp(r.timestamp)]))
            .collect();
        payload.insert(
            format!("{}_timestamps", series_key(channel.channel)),
            Value::Array(readings),
        );
    }
    Value::Object(payload)
}

pub fn status_json(snapshot: &MeasurementsSnapshot, history: &[FilterEvent]) -> Value {
    let channels: Vec<Value> = snapshot
        .channels
        .iter()
        .map(|c| {
            json!({
                "channel": c.channel.key(),
                "sensor": c.channel.sensor(),
                "unit": c.unit.symbol(),
                "stabilized": c.stabilized,
                "good_count": c.good_count,
                "bad_count": c.bad_count,
                "error_count": c.error_count,
            })
        })
        .collect();

    let logs: Vec<Value> = history
        .iter()
        .map(|e| json!([describe(e), iso_timestamp(e.timestamp)]))
        .collect();

    json!({ "channels": channels, "logs": logs })
}

fn describe(event: &FilterEvent) -> String {
    let key = event.channel.key();
    match event.kind {
        EventKind::Decision { decision, value } => {
            format!("{key}: {} {:.2}", decision.label(), value)
        }
        EventKind::MalformedSample => format!("{key}: malformed sample"),
        EventKind::ReadFailure => format!("{key}: read failed"),
        EventKind::Rearmed => format!("{key}: stabilization re-armed"),
    }
}
