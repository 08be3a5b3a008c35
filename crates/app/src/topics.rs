//! Topic namer — deterministic MQTT topic derivation.
//!
//! Every topic is a pure function of the configured prefixes, the hub
//! name, the entity kind, and the entity-local id, so a device+channel
//! combination always lands on the same topic across restarts.

use crate::classifier::EntityKind;

/// Immutable topic configuration snapshot.
///
/// Pass one snapshot into each discovery pass; never re-read ambient
/// configuration mid-operation, or topic names can diverge within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    /// Home Assistant discovery prefix (conventionally `homeassistant`).
    pub discovery_prefix: String,
    /// Hub's own base topic for availability/debug.
    pub base_topic: String,
    /// Hub name segment inside discovery topics.
    pub hub_name: String,
}

impl TopicScheme {
    /// Topic base for one entity: `{prefix}/{component}/{hub}/{entityId}`.
    #[must_use]
    pub fn entity_topic(&self, kind: EntityKind, entity_id: &str) -> String {
        format!(
            "{}/{}/{}/{entity_id}",
            self.discovery_prefix,
            kind.component(),
            self.hub_name
        )
    }

    /// Retained discovery config topic.
    #[must_use]
    pub fn config_topic(&self, kind: EntityKind, entity_id: &str) -> String {
        format!("{}/config", self.entity_topic(kind, entity_id))
    }

    /// State topic.
    #[must_use]
    pub fn state_topic(&self, kind: EntityKind, entity_id: &str) -> String {
        format!("{}/state", self.entity_topic(kind, entity_id))
    }

    /// Command topic.
    #[must_use]
    pub fn command_topic(&self, kind: EntityKind, entity_id: &str) -> String {
        format!("{}/set", self.entity_topic(kind, entity_id))
    }

    /// Climate mode command topic.
    #[must_use]
    pub fn mode_command_topic(&self, entity_id: &str) -> String {
        format!("{}/set/mode", self.entity_topic(EntityKind::Climate, entity_id))
    }

    /// Climate setpoint command topic.
    #[must_use]
    pub fn setpoint_command_topic(&self, entity_id: &str) -> String {
        format!(
            "{}/set/setpoint",
            self.entity_topic(EntityKind::Climate, entity_id)
        )
    }

    /// Hub online/offline topic (also the MQTT last-will target).
    #[must_use]
    pub fn availability_topic(&self) -> String {
        format!("{}/{}/available", self.base_topic, self.hub_name)
    }

    /// Free-text debug log topic (non-retained).
    #[must_use]
    pub fn debug_topic(&self) -> String {
        format!("{}/{}/debug", self.base_topic, self.hub_name)
    }

    /// Subscription filters covering all command topics.
    #[must_use]
    pub fn command_filters(&self) -> [String; 2] {
        [
            format!("{}/+/{}/+/set", self.discovery_prefix, self.hub_name),
            format!("{}/+/{}/+/set/#", self.discovery_prefix, self.hub_name),
        ]
    }
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self {
            discovery_prefix: "homeassistant".to_string(),
            base_topic: "hasslink".to_string(),
            hub_name: "hasslink".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> TopicScheme {
        TopicScheme {
            discovery_prefix: "homeassistant".to_string(),
            base_topic: "hub".to_string(),
            hub_name: "tellstick".to_string(),
        }
    }

    #[test]
    fn should_build_entity_topic_triad() {
        let scheme = scheme();
        assert_eq!(
            scheme.config_topic(EntityKind::Switch, "12"),
            "homeassistant/switch/tellstick/12/config"
        );
        assert_eq!(
            scheme.state_topic(EntityKind::Switch, "12"),
            "homeassistant/switch/tellstick/12/state"
        );
        assert_eq!(
            scheme.command_topic(EntityKind::Switch, "12"),
            "homeassistant/switch/tellstick/12/set"
        );
    }

    #[test]
    fn should_namespace_remote_topics_under_binary_sensor() {
        let scheme = scheme();
        assert_eq!(
            scheme.entity_topic(EntityKind::Remote, "3"),
            "homeassistant/binary_sensor/tellstick/3"
        );
    }

    #[test]
    fn should_build_climate_sub_command_topics() {
        let scheme = scheme();
        assert_eq!(
            scheme.mode_command_topic("4"),
            "homeassistant/climate/tellstick/4/set/mode"
        );
        assert_eq!(
            scheme.setpoint_command_topic("4"),
            "homeassistant/climate/tellstick/4/set/setpoint"
        );
    }

    #[test]
    fn should_build_availability_and_debug_topics_from_base() {
        let scheme = scheme();
        assert_eq!(scheme.availability_topic(), "hub/tellstick/available");
        assert_eq!(scheme.debug_topic(), "hub/tellstick/debug");
    }

    #[test]
    fn should_build_command_subscription_filters() {
        let filters = scheme().command_filters();
        assert_eq!(filters[0], "homeassistant/+/tellstick/+/set");
        assert_eq!(filters[1], "homeassistant/+/tellstick/+/set/#");
    }

    #[test]
    fn should_produce_identical_topics_for_identical_input() {
        let scheme = scheme();
        assert_eq!(
            scheme.state_topic(EntityKind::Sensor, "7_temp_0"),
            scheme.state_topic(EntityKind::Sensor, "7_temp_0")
        );
    }
}
