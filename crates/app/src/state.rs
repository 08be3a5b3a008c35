//! State encoder — converts a device's current state into the wire payload
//! each entity kind expects.
//!
//! An encode can yield zero payloads (nothing to report), one, or two: a
//! momentary bell pulse on a switch publishes `"ON"` followed by `"OFF"`.

use serde_json::json;

use hasslink_domain::capabilities::Capabilities;
use hasslink_domain::device::{DeviceState, HubDevice};
use hasslink_domain::sensor::SensorType;

use crate::classifier::{EntityKind, EntitySkeleton};
use crate::payload::ha_mode;

/// Whether publishes for this kind are retained, given the configured
/// global flag. Remote entities are momentary and never retained.
#[must_use]
pub fn retain_for(kind: EntityKind, configured: bool) -> bool {
    match kind {
        EntityKind::Remote => false,
        _ => configured,
    }
}

fn on_off(on: bool) -> String {
    if on { "ON".to_string() } else { "OFF".to_string() }
}

fn light_payload(device: &HubDevice) -> String {
    let (state, brightness) = match device.state {
        DeviceState::Dim => {
            let level = device.state_value.unwrap_or(0).clamp(0, 255);
            (level > 0, level)
        }
        DeviceState::On => (true, device.state_value.unwrap_or(255).clamp(0, 255)),
        _ => (false, 0),
    };
    json!({ "state": on_off(state), "brightness": brightness }).to_string()
}

fn cover_payload(device: &HubDevice) -> String {
    if device.capabilities.contains(Capabilities::DIM) {
        // Positional cover: report the raw 0–255 position.
        return device.state_value.unwrap_or(0).clamp(0, 255).to_string();
    }
    match device.state {
        DeviceState::Up => "OPEN".to_string(),
        DeviceState::Down => "CLOSED".to_string(),
        _ => "STOP".to_string(),
    }
}

fn climate_payload(device: &HubDevice) -> Option<String> {
    let thermostat = device.thermostat.as_ref()?;
    let mode = thermostat.current_mode()?;
    let setpoint = thermostat.setpoint(mode);

    let mut payload = json!({
        "setpoint": setpoint,
        "mode": ha_mode(mode),
    });
    if let Some(reading) = device.first_reading(SensorType::Temperature) {
        payload["temperature"] = json!(reading.value);
    }
    Some(payload.to_string())
}

fn sensor_payload(device: &HubDevice, sensor_type: SensorType, scale: u8) -> Option<String> {
    let reading = device.reading(sensor_type, scale)?;
    Some(
        json!({
            "value": reading.value,
            "lastUpdated": reading.last_updated.map(|ts| ts.timestamp()),
        })
        .to_string(),
    )
}

/// Encode the current state payload(s) for one entity.
///
/// Returns an empty vector when there is nothing to publish (unknown
/// battery, missing sensor channel, thermostat without state).
#[must_use]
pub fn encode_state(skeleton: &EntitySkeleton, device: &HubDevice) -> Vec<String> {
    match skeleton.kind {
        EntityKind::BinarySensor | EntityKind::Remote => {
            // A relayed bell pulse reads as active, same as a plain ON.
            let on = matches!(device.state, DeviceState::On | DeviceState::Bell);
            vec![on_off(on)]
        }
        EntityKind::Switch => {
            let on = matches!(device.state, DeviceState::On | DeviceState::Bell);
            let mut payloads = vec![on_off(on)];
            // A bell is a pulse: fire ON then immediately settle to OFF.
            if device.state == DeviceState::Bell {
                payloads.push(on_off(false));
            }
            payloads
        }
        EntityKind::Light => vec![light_payload(device)],
        EntityKind::Cover => vec![cover_payload(device)],
        EntityKind::Climate => climate_payload(device).into_iter().collect(),
        EntityKind::Sensor => match skeleton.channel {
            Some((sensor_type, scale)) => {
                sensor_payload(device, sensor_type, scale).into_iter().collect()
            }
            None => device
                .battery
                .as_percent()
                .map(|level| level.to_string())
                .into_iter()
                .collect(),
        },
        // Hub and diagnostic state is owned by the engine, not the device.
        EntityKind::Hub | EntityKind::Diagnostic => Vec::new(),
    }
}
