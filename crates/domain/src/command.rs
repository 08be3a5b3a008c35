//! Commands the bridge issues back to the hub.

use serde::{Deserialize, Serialize};

/// A command to execute on a hub device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum DeviceCommand {
    TurnOn,
    TurnOff,
    /// Momentary bell pulse.
    Bell,
    /// Dim to an absolute 0–255 level (also used for cover positioning).
    Dim { level: u8 },
    Up,
    Down,
    Stop,
    /// Update the thermostat target.
    ///
    /// `change_mode` distinguishes a mode switch (which carries the target
    /// mode's stored setpoint) from a plain setpoint update within the
    /// current mode.
    SetThermostat {
        mode: String,
        temperature: f64,
        change_mode: bool,
    },
}
