//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `hasslink.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use hasslink_adapter_mqtt::MqttConfig;
use hasslink_app::settings::BridgeSettings;
use hasslink_app::topics::TopicScheme;
use hasslink_domain::hub::HubInfo;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// MQTT broker settings.
    pub mqtt: MqttConfig,
    /// Bridge behaviour settings.
    pub bridge: BridgeConfig,
    /// Hub identity presented to Home Assistant.
    pub hub: HubConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Bridge behaviour configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Home Assistant discovery prefix.
    pub discovery_prefix: String,
    /// Base topic for availability/debug.
    pub base_topic: String,
    /// Hub name segment inside discovery topics.
    pub hub_name: String,
    /// Retain state publishes.
    pub retain: bool,
    /// Group entities under per-device registry entries via `via_device`.
    pub use_via_device: bool,
    /// Path of the persisted known-entity file.
    pub state_file: String,
}

/// Hub identity configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Display name.
    pub name: String,
    /// MAC address in colon notation.
    pub mac: String,
    /// Product/model string.
    pub product: String,
    /// Firmware version string.
    pub firmware_version: String,
    /// Optional admin URL shown in the device registry.
    pub configuration_url: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `hasslink.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("hasslink.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HASSLINK_MQTT_HOST") {
            self.mqtt.host = val;
        }
        if let Ok(val) = std::env::var("HASSLINK_MQTT_PORT") {
            if let Ok(port) = val.parse() {
                self.mqtt.port = port;
            }
        }
        if let Ok(val) = std::env::var("HASSLINK_MQTT_USERNAME") {
            self.mqtt.username = Some(val);
        }
        if let Ok(val) = std::env::var("HASSLINK_MQTT_PASSWORD") {
            self.mqtt.password = Some(val);
        }
        if let Ok(val) = std::env::var("HASSLINK_STATE_FILE") {
            self.bridge.state_file = val;
        }
        if let Ok(val) = std::env::var("HASSLINK_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.port == 0 {
            return Err(ConfigError::Validation(
                "mqtt port must be non-zero".to_string(),
            ));
        }
        for (field, value) in [
            ("bridge.discovery_prefix", &self.bridge.discovery_prefix),
            ("bridge.base_topic", &self.bridge.base_topic),
            ("bridge.hub_name", &self.bridge.hub_name),
        ] {
            if value.is_empty() || value.contains(['/', '+', '#']) {
                return Err(ConfigError::Validation(format!(
                    "{field} must be a single non-empty topic segment"
                )));
            }
        }
        Ok(())
    }

    /// Hub identity with the compact MAC derived from the colon form.
    #[must_use]
    pub fn hub_info(&self) -> HubInfo {
        HubInfo {
            name: self.hub.name.clone(),
            mac_compact: self
                .hub
                .mac
                .chars()
                .filter(|c| *c != ':')
                .collect::<String>()
                .to_uppercase(),
            mac: self.hub.mac.clone(),
            product: self.hub.product.clone(),
            firmware_version: self.hub.firmware_version.clone(),
            configuration_url: self.hub.configuration_url.clone(),
        }
    }

    /// The immutable settings snapshot the engine runs with.
    #[must_use]
    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            topics: TopicScheme {
                discovery_prefix: self.bridge.discovery_prefix.clone(),
                base_topic: self.bridge.base_topic.clone(),
                hub_name: self.bridge.hub_name.clone(),
            },
            hub: self.hub_info(),
            retain: self.bridge.retain,
            use_via_device: self.bridge.use_via_device,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            discovery_prefix: "homeassistant".to_string(),
            base_topic: "hasslink".to_string(),
            hub_name: "hasslink".to_string(),
            retain: false,
            use_via_device: false,
            state_file: "hasslink-state.json".to_string(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            name: "hasslink".to_string(),
            mac: "00:11:22:33:44:55".to_string(),
            product: "virtual-hub".to_string(),
            firmware_version: env!("CARGO_PKG_VERSION").to_string(),
            configuration_url: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hasslinkd=info,hasslink=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
