// ── Telemetry normalizer ──
//
// Collapses the loose device event envelope into a closed, typed set.
// Device firmwares disagree about payload placement (fields under
// `data` vs flat on the frame), so the `data.field ?? field` fallback
// lives here, once. Downstream code only ever sees `TelemetryEvent`.
//
// Telemetry loss is normal: a frame that cannot be normalized yields
// `None` with a debug log, never an error.

use serde_json::Value;
use spoolfleet_api::DeviceEvent;
use tracing::debug;

/// One scale reading from a device.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSample {
    pub device_id: String,
    pub grams: f64,
    /// Set when the scale firmware judged the reading settled.
    pub stable: bool,
    pub raw_adc: Option<i64>,
}

/// The closed event set the reconciliation engine consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    Weight(WeightSample),
    TagDetected { device_id: String, uid: String },
    TagRemoved { device_id: String },
    DeviceOnline { device_id: String },
    DeviceOffline { device_id: String },
}

impl TelemetryEvent {
    /// The device this event belongs to.
    pub fn device_id(&self) -> &str {
        match self {
            Self::Weight(sample) => &sample.device_id,
            Self::TagDetected { device_id, .. }
            | Self::TagRemoved { device_id }
            | Self::DeviceOnline { device_id }
            | Self::DeviceOffline { device_id } => device_id,
        }
    }
}

/// Normalize one raw frame into a typed event.
///
/// Returns `None` for unknown event names, missing device ids, or
/// payloads without the fields the event requires.
pub fn normalize(event: &DeviceEvent) -> Option<TelemetryEvent> {
    let Some(device_id) = device_id(event) else {
        debug!(event = %event.event, "telemetry frame without device id, dropped");
        return None;
    };

    match event.event.as_str() {
        "scale_reading" => {
            let Some(grams) = field(event, "weight_grams").and_then(Value::as_f64) else {
                debug!(%device_id, "scale_reading without weight_grams, dropped");
                return None;
            };
            let stable = field(event, "stable").and_then(Value::as_bool).unwrap_or(false);
            let raw_adc = field(event, "raw_adc").and_then(Value::as_i64);

            Some(TelemetryEvent::Weight(WeightSample {
                device_id,
                grams,
                stable,
                raw_adc,
            }))
        }

        "tag_detected" => {
            let Some(uid) = field(event, "tag_uid")
                .or_else(|| field(event, "uid"))
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())
            else {
                debug!(%device_id, "tag_detected without tag uid, dropped");
                return None;
            };
            Some(TelemetryEvent::TagDetected {
                device_id,
                uid: uid.to_owned(),
            })
        }

        "tag_removed" => Some(TelemetryEvent::TagRemoved { device_id }),

        // Heartbeats carry diagnostics (nfc_ok, scale_ok, uptime) we do
        // not model; they only prove the device is alive.
        "heartbeat" | "device_online" | "device_registered" => {
            Some(TelemetryEvent::DeviceOnline { device_id })
        }

        "device_offline" => Some(TelemetryEvent::DeviceOffline { device_id }),

        other => {
            debug!(event = other, %device_id, "unknown telemetry event, dropped");
            None
        }
    }
}

// ── Payload field access ────────────────────────────────────────────

/// Look a field up under `data`, falling back to the flat frame.
fn field<'a>(event: &'a DeviceEvent, name: &str) -> Option<&'a Value> {
    event.data.get(name).or_else(|| event.extra.get(name))
}

fn device_id(event: &DeviceEvent) -> Option<String> {
    event
        .device_id
        .clone()
        .or_else(|| {
            field(event, "device_id")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(raw: serde_json::Value) -> DeviceEvent {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn scale_reading_with_nested_payload() {
        let event = frame(json!({
            "event": "scale_reading",
            "device_id": "sb-01",
            "data": { "weight_grams": 503.2, "stable": true, "raw_adc": 812345 }
        }));

        let Some(TelemetryEvent::Weight(sample)) = normalize(&event) else {
            panic!("expected a weight event");
        };
        assert_eq!(sample.device_id, "sb-01");
        assert!((sample.grams - 503.2).abs() < f64::EPSILON);
        assert!(sample.stable);
        assert_eq!(sample.raw_adc, Some(812_345));
    }

    #[test]
    fn scale_reading_with_flat_payload() {
        // Older firmware: everything at the top level of the frame.
        let event = frame(json!({
            "event": "scale_reading",
            "device_id": "sb-02",
            "weight_grams": 120.0
        }));

        let Some(TelemetryEvent::Weight(sample)) = normalize(&event) else {
            panic!("expected a weight event");
        };
        assert!((sample.grams - 120.0).abs() < f64::EPSILON);
        assert!(!sample.stable, "missing stable flag defaults to false");
    }

    #[test]
    fn nested_payload_wins_over_flat() {
        let event = frame(json!({
            "event": "scale_reading",
            "device_id": "sb-01",
            "weight_grams": 1.0,
            "data": { "weight_grams": 2.0 }
        }));

        let Some(TelemetryEvent::Weight(sample)) = normalize(&event) else {
            panic!("expected a weight event");
        };
        assert!((sample.grams - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tag_events_extract_uid_and_device() {
        let detected = frame(json!({
            "event": "tag_detected",
            "data": { "device_id": "sb-01", "tag_uid": "04AABB" }
        }));
        assert_eq!(
            normalize(&detected),
            Some(TelemetryEvent::TagDetected {
                device_id: "sb-01".into(),
                uid: "04AABB".into(),
            })
        );

        let removed = frame(json!({
            "event": "tag_removed",
            "device_id": "sb-01",
            "data": {}
        }));
        assert_eq!(
            normalize(&removed),
            Some(TelemetryEvent::TagRemoved { device_id: "sb-01".into() })
        );
    }

    #[test]
    fn heartbeat_maps_to_online() {
        let event = frame(json!({
            "event": "heartbeat",
            "device_id": "sb-01",
            "data": { "nfc_ok": true, "scale_ok": true, "uptime": 1234 }
        }));
        assert_eq!(
            normalize(&event),
            Some(TelemetryEvent::DeviceOnline { device_id: "sb-01".into() })
        );
    }

    #[test]
    fn malformed_frames_drop_without_error() {
        // No device id anywhere
        assert_eq!(
            normalize(&frame(json!({ "event": "scale_reading", "data": { "weight_grams": 1.0 } }))),
            None
        );
        // Weight missing
        assert_eq!(
            normalize(&frame(json!({ "event": "scale_reading", "device_id": "sb-01" }))),
            None
        );
        // Tag without uid
        assert_eq!(
            normalize(&frame(json!({ "event": "tag_detected", "device_id": "sb-01" }))),
            None
        );
        // Unknown event name
        assert_eq!(
            normalize(&frame(json!({ "event": "firmware_update", "device_id": "sb-01" }))),
            None
        );
    }
}
