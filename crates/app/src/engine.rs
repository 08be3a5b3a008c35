//! Bridge engine — orchestrates discovery, state publishing, and command
//! routing over the port traits.
//!
//! The engine owns the known-entity registry behind a lock; every pass
//! that reads or rewrites the set holds the lock for the whole pass so a
//! reconnect-driven full discovery never interleaves with a device event.

use tokio::sync::Mutex;

use hasslink_domain::device::HubDevice;
use hasslink_domain::sensor::SensorType;

use crate::classifier::{EntityKind, EntitySkeleton, classify, primary_kind};
use crate::command::{decode, parse_topic};
use crate::payload::{build_config, diagnostic_config, hub_config};
use crate::ports::{BridgeHandler, ConfigStore, DeviceGateway, PayloadPublisher};
use crate::registry::{KnownEntity, KnownEntityRegistry};
use crate::settings::BridgeSettings;
use crate::state::{encode_state, retain_for};

/// Entity-local id of the hub connectivity entity.
const HUB_ENTITY_ID: &str = "hub";
/// Entity-local id of the diagnostic device-count sensor.
const DIAGNOSTIC_ENTITY_ID: &str = "hub_devices";

pub struct BridgeEngine<G, P, S> {
    gateway: G,
    publisher: P,
    registry: Mutex<KnownEntityRegistry<S>>,
    settings: BridgeSettings,
}

impl<G, P, S> BridgeEngine<G, P, S>
where
    G: DeviceGateway,
    P: PayloadPublisher,
    S: ConfigStore,
{
    pub fn new(
        gateway: G,
        publisher: P,
        registry: KnownEntityRegistry<S>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            gateway,
            publisher,
            registry: Mutex::new(registry),
            settings,
        }
    }

    /// Mirror a log line onto the non-retained debug topic.
    pub async fn debug(&self, message: &str) {
        self.publisher
            .publish(&self.settings.topics.debug_topic(), message, false)
            .await;
    }

    /// Publish config + initial state for one classified entity.
    ///
    /// `None` means the entity was skipped; siblings are unaffected.
    async fn publish_entity(
        &self,
        skeleton: &EntitySkeleton,
        device: &HubDevice,
    ) -> Option<KnownEntity> {
        let config = match build_config(skeleton, device, &self.settings) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(
                    device_id = device.id,
                    entity_id = %skeleton.entity_id,
                    %error,
                    "skipping entity"
                );
                return None;
            }
        };
        let payload = match serde_json::to_string(&config) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(entity_id = %skeleton.entity_id, %error, "skipping entity");
                return None;
            }
        };

        let topics = &self.settings.topics;
        self.publisher
            .publish(
                &topics.config_topic(skeleton.kind, &skeleton.entity_id),
                &payload,
                true,
            )
            .await;
        self.publish_state(skeleton, device).await;

        Some(KnownEntity::new(
            skeleton.kind,
            skeleton.device_id,
            skeleton.entity_id.clone(),
        ))
    }

    /// Publish the current state payload(s) for one entity.
    async fn publish_state(&self, skeleton: &EntitySkeleton, device: &HubDevice) {
        let topic = self
            .settings
            .topics
            .state_topic(skeleton.kind, &skeleton.entity_id);
        let retain = retain_for(skeleton.kind, self.settings.retain);
        for payload in encode_state(skeleton, device) {
            self.publisher.publish(&topic, &payload, retain).await;
        }
    }

    /// Erase the retained config and state of one entity.
    async fn undiscover(&self, entity: &KnownEntity) {
        tracing::info!(
            kind = %entity.kind,
            entity_id = %entity.entity_id,
            "retracting entity"
        );
        let topics = &self.settings.topics;
        self.publisher
            .publish(&topics.config_topic(entity.kind, &entity.entity_id), "", true)
            .await;
        self.publisher
            .publish(&topics.state_topic(entity.kind, &entity.entity_id), "", true)
            .await;
    }

    /// Discover one device while the registry lock is held.
    async fn discover_locked(
        &self,
        registry: &mut KnownEntityRegistry<S>,
        device: &HubDevice,
    ) -> Vec<KnownEntity> {
        let mut published = Vec::new();
        for skeleton in classify(device) {
            if let Some(entity) = self.publish_entity(&skeleton, device).await {
                registry.insert(entity.clone()).await;
                published.push(entity);
            }
        }
        published
    }

    /// Classify and publish every entity of one device, recording them.
    pub async fn discover_device(&self, device: &HubDevice) -> Vec<KnownEntity> {
        let mut registry = self.registry.lock().await;
        self.discover_locked(&mut registry, device).await
    }

    /// Publish the hub connectivity entity and its retained `online` state.
    async fn publish_hub_entity(&self) -> Option<KnownEntity> {
        let topics = &self.settings.topics;
        let payload = match serde_json::to_string(&hub_config(&self.settings)) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, "skipping hub entity");
                return None;
            }
        };
        self.publisher
            .publish(&topics.config_topic(EntityKind::Hub, HUB_ENTITY_ID), &payload, true)
            .await;
        self.publisher
            .publish(
                &topics.state_topic(EntityKind::Hub, HUB_ENTITY_ID),
                "online",
                true,
            )
            .await;
        Some(KnownEntity {
            kind: EntityKind::Hub,
            device_id: HUB_ENTITY_ID.to_string(),
            entity_id: HUB_ENTITY_ID.to_string(),
        })
    }

    /// Publish the diagnostic device-count sensor.
    async fn publish_diagnostic_entity(&self, device_count: usize) -> Option<KnownEntity> {
        let topics = &self.settings.topics;
        let payload = match serde_json::to_string(&diagnostic_config(&self.settings)) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, "skipping diagnostic entity");
                return None;
            }
        };
        self.publisher
            .publish(
                &topics.config_topic(EntityKind::Diagnostic, DIAGNOSTIC_ENTITY_ID),
                &payload,
                true,
            )
            .await;
        self.publisher
            .publish(
                &topics.state_topic(EntityKind::Diagnostic, DIAGNOSTIC_ENTITY_ID),
                &serde_json::json!({ "value": device_count }).to_string(),
                self.settings.retain,
            )
            .await;
        Some(KnownEntity {
            kind: EntityKind::Diagnostic,
            device_id: HUB_ENTITY_ID.to_string(),
            entity_id: DIAGNOSTIC_ENTITY_ID.to_string(),
        })
    }

    /// Re-publish everything and retract whatever no longer exists.
    ///
    /// Runs on every (re)connect; publishing the same set twice is a no-op
    /// from Home Assistant's point of view.
    pub async fn run_full_discovery(&self) {
        let devices = match self.gateway.list_devices().await {
            Ok(devices) => devices,
            Err(error) => {
                tracing::warn!(%error, "device listing failed, keeping published set");
                return;
            }
        };

        let mut registry = self.registry.lock().await;
        let mut new_set = Vec::new();

        if let Some(entity) = self.publish_hub_entity().await {
            new_set.push(entity);
        }
        if let Some(entity) = self.publish_diagnostic_entity(devices.len()).await {
            new_set.push(entity);
        }
        for device in &devices {
            for skeleton in classify(device) {
                if let Some(entity) = self.publish_entity(&skeleton, device).await {
                    new_set.push(entity);
                }
            }
        }

        let removed = registry.diff_and_swap(new_set).await;
        for entity in &removed {
            self.undiscover(entity).await;
        }
        tracing::info!(
            devices = devices.len(),
            entities = registry.snapshot().len(),
            retracted = removed.len(),
            "full discovery complete"
        );
        self.debug(&format!(
            "discovery: {} devices, {} entities, {} retracted",
            devices.len(),
            registry.snapshot().len(),
            removed.len()
        ))
        .await;
    }

    pub async fn on_device_added(&self, device_id: u32) {
        match self.gateway.device_by_id(device_id).await {
            Ok(Some(device)) => {
                let published = self.discover_device(&device).await;
                tracing::info!(device_id, entities = published.len(), "device added");
            }
            Ok(None) => tracing::warn!(device_id, "added device not found"),
            Err(error) => tracing::warn!(device_id, %error, "device lookup failed"),
        }
    }

    pub async fn on_device_removed(&self, device_id: u32) {
        let mut registry = self.registry.lock().await;
        let removed = registry.remove_device(&device_id.to_string()).await;
        for entity in &removed {
            self.undiscover(entity).await;
        }
        tracing::info!(device_id, entities = removed.len(), "device removed");
    }

    /// A device changed shape (name, capabilities, type): retract what was
    /// published for it, then discover it afresh.
    pub async fn on_device_updated(&self, device_id: u32) {
        let mut registry = self.registry.lock().await;
        let removed = registry.remove_device(&device_id.to_string()).await;
        for entity in &removed {
            self.undiscover(entity).await;
        }
        match self.gateway.device_by_id(device_id).await {
            Ok(Some(device)) => {
                self.discover_locked(&mut registry, &device).await;
            }
            Ok(None) => tracing::debug!(device_id, "updated device no longer exists"),
            Err(error) => tracing::warn!(device_id, %error, "device lookup failed"),
        }
    }

    /// Publish fresh state for every entity of a device, late-discovering
    /// entities that were never published (exactly once each).
    pub async fn on_device_state_changed(&self, device_id: u32) {
        let device = match self.gateway.device_by_id(device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                tracing::warn!(device_id, "state change for unknown device");
                return;
            }
            Err(error) => {
                tracing::warn!(device_id, %error, "device lookup failed");
                return;
            }
        };

        let mut registry = self.registry.lock().await;
        let device_key = device_id.to_string();
        for skeleton in classify(&device) {
            if registry.contains(skeleton.kind, &device_key, &skeleton.entity_id) {
                self.publish_state(&skeleton, &device).await;
            } else if let Some(entity) = self.publish_entity(&skeleton, &device).await {
                registry.insert(entity).await;
            }
        }
    }

    /// Publish one sensor channel's new reading, late-discovering its
    /// entity when a device grows a channel mid-run.
    ///
    /// Battery-powered pure-sensor devices only ever emit sensor updates,
    /// so the battery entity's state rides along on every one of them.
    pub async fn on_sensor_value_updated(&self, device_id: u32, sensor_type: SensorType, scale: u8) {
        let device = match self.gateway.device_by_id(device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                tracing::warn!(device_id, "sensor update for unknown device");
                return;
            }
            Err(error) => {
                tracing::warn!(device_id, %error, "device lookup failed");
                return;
            }
        };

        let mut registry = self.registry.lock().await;
        let device_key = device_id.to_string();
        for skeleton in classify(&device) {
            let matches_channel = skeleton.channel == Some((sensor_type, scale));
            let is_battery = skeleton.kind == EntityKind::Sensor && skeleton.channel.is_none();
            if !matches_channel && !is_battery {
                continue;
            }
            if registry.contains(skeleton.kind, &device_key, &skeleton.entity_id) {
                self.publish_state(&skeleton, &device).await;
            } else if let Some(entity) = self.publish_entity(&skeleton, &device).await {
                registry.insert(entity).await;
            }
        }
    }

    /// Retract everything published, then mark the hub offline.
    pub async fn shutdown(&self) {
        let mut registry = self.registry.lock().await;
        let removed = registry.diff_and_swap(Vec::new()).await;
        for entity in &removed {
            self.undiscover(entity).await;
        }
        self.publisher
            .publish(&self.settings.topics.availability_topic(), "offline", true)
            .await;
        tracing::info!(entities = removed.len(), "shutdown retraction complete");
    }
}

impl<G, P, S> BridgeHandler for BridgeEngine<G, P, S>
where
    G: DeviceGateway,
    P: PayloadPublisher,
    S: ConfigStore,
{
    async fn on_connected(&self) {
        self.publisher
            .publish(&self.settings.topics.availability_topic(), "online", true)
            .await;
        self.run_full_discovery().await;
    }

    /// Route one inbound command. Every failure is logged and dropped;
    /// nothing reaches the hub on a parse or lookup error.
    async fn on_command(&self, topic: &str, payload: &[u8]) {
        let parsed = match parse_topic(&self.settings.topics, topic) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::warn!(topic, %error, "dropping command");
                return;
            }
        };
        let device = match self.gateway.device_by_id(parsed.device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                tracing::warn!(device_id = parsed.device_id, "command for unknown device");
                return;
            }
            Err(error) => {
                tracing::warn!(device_id = parsed.device_id, %error, "device lookup failed");
                return;
            }
        };
        let Some(kind) = primary_kind(&device) else {
            tracing::warn!(device_id = device.id, "command for uncontrollable device");
            return;
        };
        let command = match decode(kind, parsed.sub.as_deref(), payload, &device) {
            Ok(command) => command,
            Err(error) => {
                tracing::warn!(device_id = device.id, %error, "dropping command");
                return;
            }
        };

        tracing::info!(device_id = device.id, ?command, "forwarding command");
        if let Err(error) = self.gateway.send_command(device.id, command).await {
            tracing::warn!(device_id = device.id, %error, "command delivery failed");
        }
    }
}
