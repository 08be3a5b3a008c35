//! MQTT adapter error types.

use hasslink_domain::error::BridgeError;

/// Errors specific to the MQTT transport.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client rejected a request (queue closed or full).
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),
}

impl From<MqttError> for BridgeError {
    fn from(err: MqttError) -> Self {
        BridgeError::Publish {
            reason: err.to_string(),
        }
    }
}
