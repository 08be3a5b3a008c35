//! `HubDevice` — the hub's device abstraction as seen by the bridge.
//!
//! Read-only from the bridge's perspective: the hub owns these and the
//! bridge only classifies, encodes, and sends commands back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capabilities::Capabilities;
use crate::sensor::{SensorReading, SensorType};

/// Declared device type tag reported by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Thermostat,
    RemoteControl,
    Light,
    WindowCovering,
    #[default]
    Generic,
}

/// Battery level as reported by the hub.
///
/// The hub reports either one of three symbolic levels or a raw percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryLevel {
    Low,
    Ok,
    #[default]
    Unknown,
    Percent(u8),
}

impl BatteryLevel {
    /// Percentage to report to Home Assistant, or `None` when unknown.
    ///
    /// `Low` is reported as a fixed 1 percent. That value is a legacy
    /// convention of the hub protocol, kept as-is.
    #[must_use]
    pub fn as_percent(self) -> Option<u8> {
        match self {
            Self::Low => Some(1),
            Self::Ok => Some(100),
            Self::Unknown => None,
            Self::Percent(level) => Some(level),
        }
    }

    /// Whether the hub reported any battery information at all.
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Discrete device state reported by the hub, paired with an optional
/// numeric value (dim level, cover position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    On,
    Off,
    Bell,
    Dim,
    Up,
    Down,
    Stop,
    Thermostat,
    #[default]
    Unknown,
}

/// Thermostat-specific state: current mode and per-mode setpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThermostatState {
    /// Currently active mode (hub vocabulary, e.g. `heat`, `cool`, `fan`).
    pub mode: Option<String>,
    /// Modes the device supports.
    pub available_modes: Vec<String>,
    /// Target temperature per mode.
    pub setpoints: BTreeMap<String, f64>,
}

impl ThermostatState {
    /// The active mode, falling back to the first available one.
    #[must_use]
    pub fn current_mode(&self) -> Option<&str> {
        self.mode
            .as_deref()
            .or_else(|| self.available_modes.first().map(String::as_str))
    }

    /// Setpoint for the given mode, if one exists.
    #[must_use]
    pub fn setpoint(&self, mode: &str) -> Option<f64> {
        self.setpoints.get(mode).copied()
    }
}

/// A device as reported by the hub.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HubDevice {
    /// Hub-assigned integer identifier, stable for the device's lifetime.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Method bitmask.
    pub capabilities: Capabilities,
    /// Declared type tag.
    pub device_type: DeviceType,
    /// Battery metadata.
    pub battery: BatteryLevel,
    /// Current state.
    pub state: DeviceState,
    /// Numeric companion to `state` (dim level, cover position).
    pub state_value: Option<i64>,
    /// Whether the device accepts commands.
    pub controllable: bool,
    /// Thermostat state, present for thermostat devices.
    pub thermostat: Option<ThermostatState>,
    /// Sensor channels the device reports.
    pub sensors: Vec<SensorReading>,
    /// Protocol name, used for device-registry metadata.
    pub protocol: Option<String>,
    /// Model name, used for device-registry metadata.
    pub model: Option<String>,
    /// Room the device is placed in, if the hub knows it.
    pub room: Option<String>,
}

impl HubDevice {
    /// Whether the device exposes at least one sensor channel.
    #[must_use]
    pub fn is_sensor(&self) -> bool {
        !self.sensors.is_empty()
    }

    /// Reading on the given (type, scale) channel, if present.
    #[must_use]
    pub fn reading(&self, sensor_type: SensorType, scale: u8) -> Option<&SensorReading> {
        self.sensors
            .iter()
            .find(|reading| reading.sensor_type == sensor_type && reading.scale == scale)
    }

    /// First reading of the given type regardless of scale.
    #[must_use]
    pub fn first_reading(&self, sensor_type: SensorType) -> Option<&SensorReading> {
        self.sensors
            .iter()
            .find(|reading| reading.sensor_type == sensor_type)
    }
}
