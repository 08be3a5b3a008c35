//! MQTT transport configuration.

use serde::Deserialize;

/// Broker connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker hostname or IP address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Optional username; credentials are sent only when both username and
    /// password are set.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
    /// Client identifier.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            client_id: "hasslink".to_string(),
            keep_alive_secs: 30,
        }
    }
}
