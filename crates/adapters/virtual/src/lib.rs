//! # hasslink-adapter-virtual
//!
//! Virtual hub — a simulated device fleet for demos and integration tests.
//!
//! ## Provided devices
//!
//! | Id | Device | Behaviour |
//! |----|--------|-----------|
//! | 1 | Hallway Lamp | Dimmable light, tracks on/off/dim level |
//! | 2 | Front Door Bell | Bell switch, pulses on `Bell` |
//! | 3 | Bedroom Blinds | Up/down/stop cover |
//! | 4 | Living Room Thermostat | Heat/cool modes, setpoints, room temperature |
//! | 5 | Garden Sensor | Temperature + humidity readings, battery at 64% |
//!
//! ## Dependency rule
//! Depends on `hasslink-app` (port traits) and `hasslink-domain` only.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use hasslink_app::ports::DeviceGateway;
use hasslink_domain::capabilities::Capabilities;
use hasslink_domain::command::DeviceCommand;
use hasslink_domain::device::{
    BatteryLevel, DeviceState, DeviceType, HubDevice, ThermostatState,
};
use hasslink_domain::error::BridgeError;
use hasslink_domain::sensor::{SensorReading, SensorType};

/// Simulated hub holding a fixed fleet whose state reacts to commands.
pub struct VirtualHub {
    devices: Mutex<Vec<HubDevice>>,
}

fn fleet() -> Vec<HubDevice> {
    let mut setpoints = BTreeMap::new();
    setpoints.insert("heat".to_string(), 21.0);
    setpoints.insert("cool".to_string(), 24.0);

    vec![
        HubDevice {
            id: 1,
            name: "Hallway Lamp".to_string(),
            capabilities: Capabilities::TURN_ON | Capabilities::TURN_OFF | Capabilities::DIM,
            state: DeviceState::Off,
            controllable: true,
            protocol: Some("zwave".to_string()),
            model: Some("dimmer".to_string()),
            room: Some("Hallway".to_string()),
            ..HubDevice::default()
        },
        HubDevice {
            id: 2,
            name: "Front Door Bell".to_string(),
            capabilities: Capabilities::BELL,
            state: DeviceState::Off,
            controllable: true,
            protocol: Some("arctech".to_string()),
            model: Some("bell".to_string()),
            ..HubDevice::default()
        },
        HubDevice {
            id: 3,
            name: "Bedroom Blinds".to_string(),
            capabilities: Capabilities::UP | Capabilities::DOWN | Capabilities::STOP,
            state: DeviceState::Stop,
            controllable: true,
            protocol: Some("hasta".to_string()),
            model: Some("blind".to_string()),
            room: Some("Bedroom".to_string()),
            ..HubDevice::default()
        },
        HubDevice {
            id: 4,
            name: "Living Room Thermostat".to_string(),
            capabilities: Capabilities::TURN_ON | Capabilities::TURN_OFF,
            device_type: DeviceType::Thermostat,
            battery: BatteryLevel::Ok,
            state: DeviceState::Thermostat,
            controllable: true,
            thermostat: Some(ThermostatState {
                mode: Some("heat".to_string()),
                available_modes: vec!["heat".to_string(), "cool".to_string()],
                setpoints,
            }),
            sensors: vec![SensorReading {
                sensor_type: SensorType::Temperature,
                scale: 0,
                value: 19.5,
                last_updated: Some(Utc::now()),
            }],
            protocol: Some("zwave".to_string()),
            model: Some("thermostat".to_string()),
            room: Some("Living Room".to_string()),
            ..HubDevice::default()
        },
        HubDevice {
            id: 5,
            name: "Garden Sensor".to_string(),
            battery: BatteryLevel::Percent(64),
            sensors: vec![
                SensorReading {
                    sensor_type: SensorType::Temperature,
                    scale: 0,
                    value: 12.3,
                    last_updated: Some(Utc::now()),
                },
                SensorReading {
                    sensor_type: SensorType::Humidity,
                    scale: 0,
                    value: 78.0,
                    last_updated: Some(Utc::now()),
                },
            ],
            protocol: Some("fineoffset".to_string()),
            model: Some("temperaturehumidity".to_string()),
            room: Some("Garden".to_string()),
            ..HubDevice::default()
        },
    ]
}

impl Default for VirtualHub {
    fn default() -> Self {
        Self {
            devices: Mutex::new(fleet()),
        }
    }
}

impl VirtualHub {
    fn lock_devices(&self) -> MutexGuard<'_, Vec<HubDevice>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn apply_command(device: &mut HubDevice, command: DeviceCommand) {
    match command {
        DeviceCommand::TurnOn => device.state = DeviceState::On,
        DeviceCommand::TurnOff => device.state = DeviceState::Off,
        DeviceCommand::Bell => device.state = DeviceState::Bell,
        DeviceCommand::Dim { level } => {
            device.state = DeviceState::Dim;
            device.state_value = Some(i64::from(level));
        }
        DeviceCommand::Up => device.state = DeviceState::Up,
        DeviceCommand::Down => device.state = DeviceState::Down,
        DeviceCommand::Stop => device.state = DeviceState::Stop,
        DeviceCommand::SetThermostat {
            mode,
            temperature,
            change_mode,
        } => {
            if let Some(thermostat) = device.thermostat.as_mut() {
                thermostat.setpoints.insert(mode.clone(), temperature);
                if change_mode {
                    thermostat.mode = Some(mode);
                }
                device.state = DeviceState::Thermostat;
            }
        }
    }
}

impl DeviceGateway for VirtualHub {
    async fn list_devices(&self) -> Result<Vec<HubDevice>, BridgeError> {
        Ok(self.lock_devices().clone())
    }

    async fn device_by_id(&self, id: u32) -> Result<Option<HubDevice>, BridgeError> {
        Ok(self.lock_devices().iter().find(|d| d.id == id).cloned())
    }

    async fn send_command(&self, id: u32, command: DeviceCommand) -> Result<(), BridgeError> {
        let mut devices = self.lock_devices();
        let device = devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(BridgeError::DeviceNotFound { id })?;
        tracing::debug!(device_id = id, ?command, "virtual device command");
        apply_command(device, command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_list_five_devices() {
        let hub = VirtualHub::default();
        let devices = hub.list_devices().await.unwrap();
        assert_eq!(devices.len(), 5);
    }

    #[tokio::test]
    async fn should_resolve_device_by_id() {
        let hub = VirtualHub::default();
        let device = hub.device_by_id(4).await.unwrap().unwrap();
        assert_eq!(device.name, "Living Room Thermostat");
        assert!(hub.device_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_dim_the_lamp() {
        let hub = VirtualHub::default();
        hub.send_command(1, DeviceCommand::Dim { level: 128 })
            .await
            .unwrap();
        let device = hub.device_by_id(1).await.unwrap().unwrap();
        assert_eq!(device.state, DeviceState::Dim);
        assert_eq!(device.state_value, Some(128));
    }

    #[tokio::test]
    async fn should_move_the_blinds() {
        let hub = VirtualHub::default();
        hub.send_command(3, DeviceCommand::Down).await.unwrap();
        let device = hub.device_by_id(3).await.unwrap().unwrap();
        assert_eq!(device.state, DeviceState::Down);
    }

    #[tokio::test]
    async fn should_change_thermostat_mode_and_setpoint() {
        let hub = VirtualHub::default();
        hub.send_command(
            4,
            DeviceCommand::SetThermostat {
                mode: "cool".to_string(),
                temperature: 23.0,
                change_mode: true,
            },
        )
        .await
        .unwrap();

        let device = hub.device_by_id(4).await.unwrap().unwrap();
        let thermostat = device.thermostat.unwrap();
        assert_eq!(thermostat.mode.as_deref(), Some("cool"));
        assert_eq!(thermostat.setpoints.get("cool"), Some(&23.0));
        // The other mode's setpoint is untouched.
        assert_eq!(thermostat.setpoints.get("heat"), Some(&21.0));
    }

    #[tokio::test]
    async fn should_reject_command_for_unknown_device() {
        let hub = VirtualHub::default();
        let result = hub.send_command(99, DeviceCommand::TurnOn).await;
        assert!(matches!(result, Err(BridgeError::DeviceNotFound { id: 99 })));
    }

    #[tokio::test]
    async fn should_keep_sensor_readings_across_commands() {
        let hub = VirtualHub::default();
        hub.send_command(4, DeviceCommand::TurnOff).await.unwrap();
        let device = hub.device_by_id(4).await.unwrap().unwrap();
        assert_eq!(device.sensors.len(), 1);
        assert_eq!(device.sensors[0].sensor_type, SensorType::Temperature);
    }
}
