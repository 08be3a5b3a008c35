//! Entity classifier — maps a hub device onto Home Assistant entity kinds.
//!
//! A single hub device can yield several entities: battery and per-channel
//! sensor entities are orthogonal to the device's primary controllable
//! role and are always emitted when applicable (a dimmable sensor node
//! still reports its battery).

use serde::{Deserialize, Serialize};

use hasslink_domain::capabilities::Capabilities;
use hasslink_domain::device::{DeviceType, HubDevice};
use hasslink_domain::sensor::SensorType;

/// Closed set of entity kinds the bridge publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    BinarySensor,
    Switch,
    Light,
    Cover,
    Climate,
    Sensor,
    Remote,
    Hub,
    Diagnostic,
}

impl EntityKind {
    /// Kind name used for registry bookkeeping.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BinarySensor => "binary_sensor",
            Self::Switch => "switch",
            Self::Light => "light",
            Self::Cover => "cover",
            Self::Climate => "climate",
            Self::Sensor => "sensor",
            Self::Remote => "remote",
            Self::Hub => "hub",
            Self::Diagnostic => "diagnostic",
        }
    }

    /// Topic path component for Home Assistant discovery.
    ///
    /// Discovery has no first-class `remote` component, so remotes and the
    /// hub entity are namespaced under `binary_sensor`, and diagnostic
    /// entities under `sensor`. Internal bookkeeping keeps the real kind.
    #[must_use]
    pub fn component(self) -> &'static str {
        match self {
            Self::Remote | Self::Hub => "binary_sensor",
            Self::Diagnostic => "sensor",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification output: kind + ids only, payload filled in later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySkeleton {
    pub kind: EntityKind,
    /// Owning hub device id.
    pub device_id: u32,
    /// Entity-local id, unique per device per channel.
    pub entity_id: String,
    /// Sensor channel behind this entity, for sensor kinds.
    pub channel: Option<(SensorType, u8)>,
}

impl EntitySkeleton {
    fn new(kind: EntityKind, device_id: u32, entity_id: String) -> Self {
        Self {
            kind,
            device_id,
            entity_id,
            channel: None,
        }
    }
}

/// Entity-local id for a sensor channel: `{deviceId}_{typeSlug}_{scale}`.
#[must_use]
pub fn sensor_entity_id(device_id: u32, sensor_type: SensorType, scale: u8) -> String {
    format!("{device_id}_{}_{scale}", sensor_type.slug())
}

/// Entity-local id for a device's battery entity.
#[must_use]
pub fn battery_entity_id(device_id: u32) -> String {
    format!("{device_id}_battery")
}

/// Primary controllable kind for a device, by declared-type/capability
/// precedence. `None` when the device is not controllable at all.
#[must_use]
pub fn primary_kind(device: &HubDevice) -> Option<EntityKind> {
    if !device.controllable {
        return None;
    }
    let caps = device.capabilities;
    let kind = match device.device_type {
        DeviceType::Thermostat => EntityKind::Climate,
        DeviceType::RemoteControl => EntityKind::Remote,
        _ if caps.contains(Capabilities::UP | Capabilities::DOWN) => EntityKind::Cover,
        DeviceType::WindowCovering => EntityKind::Cover,
        DeviceType::Light => EntityKind::Light,
        _ if caps.contains(Capabilities::DIM) => EntityKind::Light,
        _ if caps.contains(Capabilities::BELL) || caps.contains(Capabilities::TURN_ON) => {
            EntityKind::Switch
        }
        // Zero matched capabilities still gets a representation.
        _ => EntityKind::BinarySensor,
    };
    Some(kind)
}

/// Classify a device into its full set of entity skeletons, in a fixed
/// order: battery, sensor channels, then the primary entity.
#[must_use]
pub fn classify(device: &HubDevice) -> Vec<EntitySkeleton> {
    let mut entities = Vec::new();

    if device.battery.is_known() {
        entities.push(EntitySkeleton::new(
            EntityKind::Sensor,
            device.id,
            battery_entity_id(device.id),
        ));
    }

    for reading in &device.sensors {
        let mut skeleton = EntitySkeleton::new(
            EntityKind::Sensor,
            device.id,
            sensor_entity_id(device.id, reading.sensor_type, reading.scale),
        );
        skeleton.channel = Some((reading.sensor_type, reading.scale));
        entities.push(skeleton);
    }

    if let Some(kind) = primary_kind(device) {
        entities.push(EntitySkeleton::new(kind, device.id, device.id.to_string()));
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use hasslink_domain::device::BatteryLevel;
    use hasslink_domain::sensor::SensorReading;

    fn controllable(caps: Capabilities, device_type: DeviceType) -> HubDevice {
        HubDevice {
            id: 7,
            name: "Test".to_string(),
            capabilities: caps,
            device_type,
            controllable: true,
            ..HubDevice::default()
        }
    }

    #[test]
    fn should_classify_thermostat_type_as_climate() {
        let device = controllable(Capabilities::TURN_ON, DeviceType::Thermostat);
        assert_eq!(primary_kind(&device), Some(EntityKind::Climate));
    }

    #[test]
    fn should_classify_remote_type_as_remote() {
        let device = controllable(Capabilities::TURN_ON, DeviceType::RemoteControl);
        assert_eq!(primary_kind(&device), Some(EntityKind::Remote));
    }

    #[test]
    fn should_classify_up_down_capability_as_cover() {
        let device = controllable(Capabilities::UP | Capabilities::DOWN, DeviceType::Generic);
        assert_eq!(primary_kind(&device), Some(EntityKind::Cover));
    }

    #[test]
    fn should_classify_window_covering_type_as_cover_without_caps() {
        let device = controllable(Capabilities::NONE, DeviceType::WindowCovering);
        assert_eq!(primary_kind(&device), Some(EntityKind::Cover));
    }

    #[test]
    fn should_classify_dim_capability_as_light() {
        let device = controllable(
            Capabilities::TURN_ON | Capabilities::DIM,
            DeviceType::Generic,
        );
        assert_eq!(primary_kind(&device), Some(EntityKind::Light));
    }

    #[test]
    fn should_classify_bell_capability_as_switch() {
        let device = controllable(Capabilities::BELL, DeviceType::Generic);
        assert_eq!(primary_kind(&device), Some(EntityKind::Switch));
    }

    #[test]
    fn should_fall_back_to_binary_sensor_with_no_capabilities() {
        let device = controllable(Capabilities::NONE, DeviceType::Generic);
        assert_eq!(primary_kind(&device), Some(EntityKind::BinarySensor));
    }

    #[test]
    fn should_not_emit_primary_for_uncontrollable_device() {
        let mut device = controllable(Capabilities::TURN_ON, DeviceType::Generic);
        device.controllable = false;
        assert_eq!(primary_kind(&device), None);
        assert!(classify(&device).is_empty());
    }

    #[test]
    fn should_always_emit_battery_entity_when_level_known() {
        for battery in [BatteryLevel::Low, BatteryLevel::Ok, BatteryLevel::Percent(50)] {
            let mut device = controllable(Capabilities::DIM, DeviceType::Generic);
            device.battery = battery;
            let batteries: Vec<_> = classify(&device)
                .into_iter()
                .filter(|e| e.entity_id.ends_with("_battery"))
                .collect();
            assert_eq!(batteries.len(), 1);
            assert_eq!(batteries[0].kind, EntityKind::Sensor);
        }
    }

    #[test]
    fn should_skip_battery_entity_when_level_unknown() {
        let device = controllable(Capabilities::TURN_ON, DeviceType::Generic);
        assert!(
            !classify(&device)
                .iter()
                .any(|e| e.entity_id.ends_with("_battery"))
        );
    }

    #[test]
    fn should_emit_one_sensor_entity_per_channel() {
        let mut device = controllable(Capabilities::NONE, DeviceType::Generic);
        device.controllable = false;
        device.sensors = vec![
            SensorReading::new(SensorType::Temperature, 0, 21.0),
            SensorReading::new(SensorType::Humidity, 0, 55.0),
        ];

        let entities = classify(&device);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].entity_id, "7_temp_0");
        assert_eq!(entities[1].entity_id, "7_humidity_0");
        assert!(entities.iter().all(|e| e.kind == EntityKind::Sensor));
    }

    #[test]
    fn should_emit_battery_sensors_and_primary_together() {
        let mut device = controllable(
            Capabilities::TURN_ON | Capabilities::DIM,
            DeviceType::Generic,
        );
        device.battery = BatteryLevel::Percent(80);
        device.sensors = vec![SensorReading::new(SensorType::Temperature, 0, 20.0)];

        let entities = classify(&device);
        assert_eq!(entities.len(), 3);
        assert_eq!(entities[0].entity_id, "7_battery");
        assert_eq!(entities[1].entity_id, "7_temp_0");
        assert_eq!(entities[2].kind, EntityKind::Light);
        assert_eq!(entities[2].entity_id, "7");
    }

    #[test]
    fn should_namespace_remote_and_hub_under_binary_sensor_topics() {
        assert_eq!(EntityKind::Remote.component(), "binary_sensor");
        assert_eq!(EntityKind::Hub.component(), "binary_sensor");
        assert_eq!(EntityKind::Diagnostic.component(), "sensor");
        assert_eq!(EntityKind::Cover.component(), "cover");
        // Bookkeeping keeps the real kind.
        assert_eq!(EntityKind::Remote.as_str(), "remote");
    }
}
