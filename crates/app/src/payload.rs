//! Discovery payload builder — kind-specific Home Assistant MQTT Discovery
//! config payloads.
//!
//! One typed struct covers every key the bridge emits; serde skips unset
//! options so each kind serializes only its own keys.

use serde::Serialize;

use hasslink_domain::capabilities::Capabilities;
use hasslink_domain::device::HubDevice;
use hasslink_domain::sensor::SensorType;

use crate::classifier::{EntityKind, EntitySkeleton, sensor_entity_id};
use crate::settings::BridgeSettings;

/// Why a discovery payload could not be built for one entity.
///
/// Never aborts a discovery batch; the affected entity is skipped and
/// siblings proceed.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The skeleton references a sensor channel the device no longer has.
    #[error("device {device_id} has no {sensor_type:?} channel at scale {scale}")]
    MissingChannel {
        device_id: u32,
        sensor_type: SensorType,
        scale: u8,
    },

    /// A climate skeleton on a device without thermostat state.
    #[error("device {device_id} has no thermostat state")]
    MissingThermostat { device_id: u32 },
}

/// Home Assistant device-registry block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceBlock {
    pub identifiers: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<(String, String)>,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    pub sw_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via_device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_url: Option<String>,
}

/// Discovery config payload published retained to `{topic}/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DiscoveryConfig {
    pub name: String,
    pub unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_after: Option<u32>,
    /// Light schema selector (`json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_position_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_state_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_state_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_state_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_state_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_temperature_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_temperature_template: Option<String>,
}

/// Rename thermostat modes for Home Assistant (`fan` → `fan_only`).
#[must_use]
pub fn ha_mode(mode: &str) -> &str {
    if mode == "fan" { "fan_only" } else { mode }
}

/// Reverse mapping for inbound mode commands.
#[must_use]
pub fn hub_mode(mode: &str) -> &str {
    if mode == "fan_only" { "fan" } else { mode }
}

/// Registry block describing the hub itself.
#[must_use]
pub fn hub_block(settings: &BridgeSettings) -> DeviceBlock {
    let hub = &settings.hub;
    DeviceBlock {
        identifiers: hub.mac_compact.clone(),
        connections: vec![("mac".to_string(), hub.mac.clone())],
        manufacturer: "hasslink".to_string(),
        model: hub.product.clone(),
        name: hub.name.clone(),
        sw_version: hub.firmware_version.clone(),
        suggested_area: None,
        via_device: None,
        configuration_url: hub.configuration_url.clone(),
    }
}

/// Registry block for one physical device, linked to the hub via
/// `via_device` so Home Assistant shows the hierarchy.
#[must_use]
pub fn via_device_block(device: &HubDevice, settings: &BridgeSettings) -> DeviceBlock {
    let hub = &settings.hub;
    DeviceBlock {
        identifiers: format!("{}_{}", hub.mac_compact, device.id),
        connections: vec![("mac".to_string(), hub.mac.clone())],
        manufacturer: device.protocol.clone().unwrap_or_else(|| "unknown".to_string()),
        model: device.model.clone().unwrap_or_else(|| "unknown".to_string()),
        name: device.name.clone(),
        sw_version: hub.firmware_version.clone(),
        suggested_area: device.room.clone(),
        via_device: Some(hub.mac_compact.clone()),
        configuration_url: None,
    }
}

fn device_block(device: &HubDevice, settings: &BridgeSettings) -> DeviceBlock {
    if settings.use_via_device {
        via_device_block(device, settings)
    } else {
        hub_block(settings)
    }
}

/// Common keys shared by every per-device entity.
fn common(skeleton: &EntitySkeleton, device: &HubDevice, settings: &BridgeSettings) -> DiscoveryConfig {
    DiscoveryConfig {
        name: device.name.clone(),
        unique_id: settings.hub.unique_id(&skeleton.entity_id),
        state_topic: Some(settings.topics.state_topic(skeleton.kind, &skeleton.entity_id)),
        availability_topic: Some(settings.topics.availability_topic()),
        device: Some(device_block(device, settings)),
        ..DiscoveryConfig::default()
    }
}

/// Build the discovery payload for one classified entity.
///
/// # Errors
///
/// Returns [`PayloadError`] when the device no longer carries the data the
/// skeleton was classified from (sensor channel or thermostat state gone).
pub fn build_config(
    skeleton: &EntitySkeleton,
    device: &HubDevice,
    settings: &BridgeSettings,
) -> Result<DiscoveryConfig, PayloadError> {
    let topics = &settings.topics;
    let mut config = common(skeleton, device, settings);

    match skeleton.kind {
        EntityKind::Sensor => match skeleton.channel {
            Some((sensor_type, scale)) => {
                if device.reading(sensor_type, scale).is_none() {
                    return Err(PayloadError::MissingChannel {
                        device_id: device.id,
                        sensor_type,
                        scale,
                    });
                }
                config.name = format!("{} {}", device.name, sensor_type.label(scale));
                config.value_template = Some("{{ value_json.value }}".to_string());
                config.unit_of_measurement = Some(sensor_type.unit(scale).to_string());
                config.state_class = Some(sensor_type.state_class(scale).to_string());
                config.device_class = sensor_type.device_class(scale).map(str::to_string);
            }
            // A sensor skeleton without a channel is the battery entity.
            None => {
                config.name = format!("{} battery", device.name);
                config.device_class = Some("battery".to_string());
                config.state_class = Some("measurement".to_string());
                config.unit_of_measurement = Some("%".to_string());
            }
        },
        EntityKind::Switch => {
            config.command_topic = Some(topics.command_topic(skeleton.kind, &skeleton.entity_id));
            if device.capabilities.contains(Capabilities::BELL) {
                config.payload_on = Some("BELL".to_string());
            }
        }
        EntityKind::Light => {
            config.command_topic = Some(topics.command_topic(skeleton.kind, &skeleton.entity_id));
            config.schema = Some("json".to_string());
            config.brightness = Some(true);
        }
        EntityKind::Cover => {
            config.command_topic = Some(topics.command_topic(skeleton.kind, &skeleton.entity_id));
            if device.capabilities.contains(Capabilities::DIM) {
                config.position_topic = config.state_topic.clone();
                config.set_position_topic = Some(format!(
                    "{}/set/pos",
                    topics.entity_topic(skeleton.kind, &skeleton.entity_id)
                ));
            }
        }
        EntityKind::Climate => {
            let thermostat = device
                .thermostat
                .as_ref()
                .ok_or(PayloadError::MissingThermostat { device_id: device.id })?;

            // Climate has no plain command topic; all commands go through
            // the mode and setpoint sub-topics.
            config.temperature_command_topic =
                Some(topics.setpoint_command_topic(&skeleton.entity_id));

            if !thermostat.available_modes.is_empty() {
                config.modes = Some(
                    thermostat
                        .available_modes
                        .iter()
                        .map(|mode| ha_mode(mode).to_string())
                        .collect(),
                );
                config.mode_command_topic = Some(topics.mode_command_topic(&skeleton.entity_id));
                config.mode_state_topic = config.state_topic.clone();
                config.mode_state_template = Some("{{ value_json.mode }}".to_string());
            }

            let has_setpoint = thermostat
                .current_mode()
                .and_then(|mode| thermostat.setpoint(mode))
                .is_some();
            if has_setpoint {
                config.temperature_state_topic = config.state_topic.clone();
                config.temperature_state_template = Some("{{ value_json.setpoint }}".to_string());
            }

            if let Some(reading) = device.first_reading(SensorType::Temperature) {
                // Point at the co-published temperature sensor entity.
                let sensor_id = sensor_entity_id(device.id, SensorType::Temperature, reading.scale);
                config.current_temperature_topic =
                    Some(topics.state_topic(EntityKind::Sensor, &sensor_id));
                config.current_temperature_template = Some("{{ value_json.value }}".to_string());
                config.unit_of_measurement =
                    Some(SensorType::Temperature.unit(reading.scale).to_string());
            }
        }
        EntityKind::Remote => {
            // Momentary by nature: the entity expires right after firing.
            config.expire_after = Some(1);
        }
        EntityKind::BinarySensor | EntityKind::Hub | EntityKind::Diagnostic => {}
    }

    Ok(config)
}

/// Discovery payload for the always-present hub connectivity entity.
#[must_use]
pub fn hub_config(settings: &BridgeSettings) -> DiscoveryConfig {
    DiscoveryConfig {
        name: settings.hub.name.clone(),
        unique_id: settings.hub.mac_compact.clone(),
        state_topic: Some(settings.topics.state_topic(EntityKind::Hub, "hub")),
        device: Some(hub_block(settings)),
        device_class: Some("connectivity".to_string()),
        payload_on: Some("online".to_string()),
        payload_off: Some("offline".to_string()),
        ..DiscoveryConfig::default()
    }
}

/// Discovery payload for the hub's diagnostic device-count sensor.
#[must_use]
pub fn diagnostic_config(settings: &BridgeSettings) -> DiscoveryConfig {
    DiscoveryConfig {
        name: format!("{} devices", settings.hub.name),
        unique_id: settings.hub.unique_id("hub_devices"),
        state_topic: Some(settings.topics.state_topic(EntityKind::Diagnostic, "hub_devices")),
        availability_topic: Some(settings.topics.availability_topic()),
        device: Some(hub_block(settings)),
        entity_category: Some("diagnostic".to_string()),
        value_template: Some("{{ value_json.value }}".to_string()),
        state_class: Some("measurement".to_string()),
        ..DiscoveryConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hasslink_domain::device::{DeviceType, ThermostatState};
    use hasslink_domain::hub::HubInfo;
    use hasslink_domain::sensor::SensorReading;

    use crate::classifier::classify;

    fn settings() -> BridgeSettings {
        BridgeSettings {
            hub: HubInfo {
                name: "tellstick".to_string(),
                mac_compact: "AABBCCDDEEFF".to_string(),
                mac: "AA:BB:CC:DD:EE:FF".to_string(),
                product: "znet-lite-v2".to_string(),
                firmware_version: "1.3.1".to_string(),
                configuration_url: Some("http://tellstick.local".to_string()),
            },
            ..BridgeSettings::default()
        }
    }

    fn light_device() -> HubDevice {
        HubDevice {
            id: 9,
            name: "Desk Lamp".to_string(),
            capabilities: Capabilities::TURN_ON | Capabilities::TURN_OFF | Capabilities::DIM,
            controllable: true,
            ..HubDevice::default()
        }
    }

    fn skeleton_for(device: &HubDevice, kind: EntityKind) -> EntitySkeleton {
        classify(device)
            .into_iter()
            .find(|s| s.kind == kind)
            .expect("kind should be classified")
    }

    #[test]
    fn should_build_light_config_with_json_schema() {
        let device = light_device();
        let skeleton = skeleton_for(&device, EntityKind::Light);
        let config = build_config(&skeleton, &device, &settings()).unwrap();

        assert_eq!(config.name, "Desk Lamp");
        assert_eq!(config.unique_id, "AABBCCDDEEFF_9");
        assert_eq!(config.schema.as_deref(), Some("json"));
        assert_eq!(config.brightness, Some(true));
        assert_eq!(
            config.command_topic.as_deref(),
            Some("homeassistant/light/hasslink/9/set")
        );
        assert_eq!(
            config.availability_topic.as_deref(),
            Some("hasslink/hasslink/available")
        );
    }

    #[test]
    fn should_emit_bell_payload_on_for_bell_switches() {
        let device = HubDevice {
            id: 2,
            name: "Door Bell".to_string(),
            capabilities: Capabilities::BELL,
            controllable: true,
            ..HubDevice::default()
        };
        let skeleton = skeleton_for(&device, EntityKind::Switch);
        let config = build_config(&skeleton, &device, &settings()).unwrap();
        assert_eq!(config.payload_on.as_deref(), Some("BELL"));
    }

    #[test]
    fn should_emit_position_topics_for_dimmable_covers() {
        let device = HubDevice {
            id: 3,
            name: "Blinds".to_string(),
            capabilities: Capabilities::UP | Capabilities::DOWN | Capabilities::DIM,
            controllable: true,
            ..HubDevice::default()
        };
        let skeleton = skeleton_for(&device, EntityKind::Cover);
        let config = build_config(&skeleton, &device, &settings()).unwrap();
        assert_eq!(
            config.set_position_topic.as_deref(),
            Some("homeassistant/cover/hasslink/3/set/pos")
        );
        assert_eq!(config.position_topic, config.state_topic);
    }

    #[test]
    fn should_build_sensor_config_with_unit_and_classes() {
        let device = HubDevice {
            id: 5,
            name: "Garden".to_string(),
            sensors: vec![SensorReading::new(SensorType::Temperature, 0, 18.5)],
            ..HubDevice::default()
        };
        let skeleton = skeleton_for(&device, EntityKind::Sensor);
        let config = build_config(&skeleton, &device, &settings()).unwrap();

        assert_eq!(config.name, "Garden temp");
        assert_eq!(config.unique_id, "AABBCCDDEEFF_5_temp_0");
        assert_eq!(config.unit_of_measurement.as_deref(), Some("°C"));
        assert_eq!(config.device_class.as_deref(), Some("temperature"));
        assert_eq!(config.state_class.as_deref(), Some("measurement"));
        assert_eq!(config.value_template.as_deref(), Some("{{ value_json.value }}"));
    }

    #[test]
    fn should_fail_when_sensor_channel_disappeared() {
        let device = HubDevice {
            id: 5,
            sensors: vec![SensorReading::new(SensorType::Temperature, 0, 18.5)],
            ..HubDevice::default()
        };
        let mut skeleton = skeleton_for(&device, EntityKind::Sensor);
        skeleton.channel = Some((SensorType::Humidity, 0));
        let result = build_config(&skeleton, &device, &settings());
        assert!(matches!(result, Err(PayloadError::MissingChannel { .. })));
    }

    #[test]
    fn should_build_battery_config() {
        let device = HubDevice {
            id: 5,
            name: "Garden".to_string(),
            battery: hasslink_domain::device::BatteryLevel::Percent(64),
            ..HubDevice::default()
        };
        let skeleton = skeleton_for(&device, EntityKind::Sensor);
        let config = build_config(&skeleton, &device, &settings()).unwrap();

        assert_eq!(config.name, "Garden battery");
        assert_eq!(config.device_class.as_deref(), Some("battery"));
        assert_eq!(config.state_class.as_deref(), Some("measurement"));
        assert_eq!(config.unit_of_measurement.as_deref(), Some("%"));
    }

    #[test]
    fn should_build_climate_config_with_mode_and_setpoint_topics() {
        let mut setpoints = std::collections::BTreeMap::new();
        setpoints.insert("heat".to_string(), 21.0);
        let device = HubDevice {
            id: 4,
            name: "Thermostat".to_string(),
            device_type: DeviceType::Thermostat,
            controllable: true,
            thermostat: Some(ThermostatState {
                mode: Some("heat".to_string()),
                available_modes: vec!["heat".to_string(), "fan".to_string()],
                setpoints,
            }),
            sensors: vec![SensorReading::new(SensorType::Temperature, 0, 19.5)],
            ..HubDevice::default()
        };
        let skeleton = skeleton_for(&device, EntityKind::Climate);
        let config = build_config(&skeleton, &device, &settings()).unwrap();

        assert_eq!(
            config.modes,
            Some(vec!["heat".to_string(), "fan_only".to_string()])
        );
        assert_eq!(
            config.mode_command_topic.as_deref(),
            Some("homeassistant/climate/hasslink/4/set/mode")
        );
        assert_eq!(
            config.temperature_command_topic.as_deref(),
            Some("homeassistant/climate/hasslink/4/set/setpoint")
        );
        assert_eq!(config.temperature_state_topic, config.state_topic);
        assert_eq!(
            config.current_temperature_topic.as_deref(),
            Some("homeassistant/sensor/hasslink/4_temp_0/state")
        );
        assert_eq!(config.unit_of_measurement.as_deref(), Some("°C"));
        assert!(config.command_topic.is_none());
    }

    #[test]
    fn should_fail_climate_without_thermostat_state() {
        let device = HubDevice {
            id: 4,
            device_type: DeviceType::Thermostat,
            controllable: true,
            ..HubDevice::default()
        };
        let skeleton = skeleton_for(&device, EntityKind::Climate);
        let result = build_config(&skeleton, &device, &settings());
        assert!(matches!(result, Err(PayloadError::MissingThermostat { .. })));
    }

    #[test]
    fn should_expire_remote_entities_immediately() {
        let device = HubDevice {
            id: 6,
            name: "Remote".to_string(),
            device_type: DeviceType::RemoteControl,
            controllable: true,
            ..HubDevice::default()
        };
        let skeleton = skeleton_for(&device, EntityKind::Remote);
        let config = build_config(&skeleton, &device, &settings()).unwrap();
        assert_eq!(config.expire_after, Some(1));
        assert!(config.command_topic.is_none());
        // Remote topics live under binary_sensor.
        assert_eq!(
            config.state_topic.as_deref(),
            Some("homeassistant/binary_sensor/hasslink/6/state")
        );
    }

    #[test]
    fn should_group_under_hub_device_block_by_default() {
        let device = light_device();
        let skeleton = skeleton_for(&device, EntityKind::Light);
        let config = build_config(&skeleton, &device, &settings()).unwrap();
        let block = config.device.unwrap();
        assert_eq!(block.identifiers, "AABBCCDDEEFF");
        assert!(block.via_device.is_none());
    }

    #[test]
    fn should_link_via_device_when_enabled() {
        let mut settings = settings();
        settings.use_via_device = true;
        let mut device = light_device();
        device.protocol = Some("zwave".to_string());
        device.room = Some("Office".to_string());

        let skeleton = skeleton_for(&device, EntityKind::Light);
        let config = build_config(&skeleton, &device, &settings).unwrap();
        let block = config.device.unwrap();
        assert_eq!(block.identifiers, "AABBCCDDEEFF_9");
        assert_eq!(block.via_device.as_deref(), Some("AABBCCDDEEFF"));
        assert_eq!(block.manufacturer, "zwave");
        assert_eq!(block.suggested_area.as_deref(), Some("Office"));
    }

    #[test]
    fn should_build_hub_connectivity_config() {
        let config = hub_config(&settings());
        assert_eq!(config.unique_id, "AABBCCDDEEFF");
        assert_eq!(config.device_class.as_deref(), Some("connectivity"));
        assert_eq!(config.payload_on.as_deref(), Some("online"));
        assert_eq!(config.payload_off.as_deref(), Some("offline"));
        assert_eq!(
            config.state_topic.as_deref(),
            Some("homeassistant/binary_sensor/hasslink/hub/state")
        );
    }

    #[test]
    fn should_build_diagnostic_config_with_entity_category() {
        let config = diagnostic_config(&settings());
        assert_eq!(config.entity_category.as_deref(), Some("diagnostic"));
        assert_eq!(
            config.state_topic.as_deref(),
            Some("homeassistant/sensor/hasslink/hub_devices/state")
        );
    }

    #[test]
    fn should_skip_unset_keys_in_serialized_payload() {
        let device = light_device();
        let skeleton = skeleton_for(&device, EntityKind::Light);
        let config = build_config(&skeleton, &device, &settings()).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("modes").is_none());
        assert!(json.get("expire_after").is_none());
        assert!(json.get("device_class").is_none());
    }

    #[test]
    fn should_rename_fan_mode_both_ways() {
        assert_eq!(ha_mode("fan"), "fan_only");
        assert_eq!(ha_mode("heat"), "heat");
        assert_eq!(hub_mode("fan_only"), "fan");
        assert_eq!(hub_mode("cool"), "cool");
    }
}
