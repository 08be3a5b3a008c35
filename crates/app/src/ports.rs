//! Port traits — the IO boundaries of the bridge engine.
//!
//! Adapters implement these; the engine stays free of transport and
//! storage concerns.

use std::future::Future;

use hasslink_domain::command::DeviceCommand;
use hasslink_domain::device::HubDevice;
use hasslink_domain::error::BridgeError;

/// Access to the hub's device manager.
pub trait DeviceGateway: Send + Sync {
    /// All devices currently known to the hub.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<HubDevice>, BridgeError>> + Send;

    /// Look up a single device by its hub id.
    fn device_by_id(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<Option<HubDevice>, BridgeError>> + Send;

    /// Issue a command to a device.
    ///
    /// Command execution on the hub is asynchronous; an `Ok` here only
    /// means the command was accepted for delivery.
    fn send_command(
        &self,
        id: u32,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

/// Fire-and-forget MQTT publishes.
///
/// The engine never awaits broker acknowledgments; implementations log
/// transport failures and return.
pub trait PayloadPublisher: Send + Sync {
    /// Publish `payload` to `topic`. An empty payload with `retain` erases
    /// a retained message.
    fn publish(
        &self,
        topic: &str,
        payload: &str,
        retain: bool,
    ) -> impl Future<Output = ()> + Send;
}

/// Persisted key/value configuration strings.
///
/// Backs the serialized known-entity set and survives process restarts.
pub trait ConfigStore: Send + Sync {
    /// Read a stored value, `None` when the key was never written.
    fn get(&self, key: &str)
    -> impl Future<Output = Result<Option<String>, BridgeError>> + Send;

    /// Write (or overwrite) a stored value.
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

/// Inbound surface the MQTT transport drives.
///
/// Implemented by the engine; the transport's network loop calls these as
/// connection and message callbacks. Callbacks are delivered serially.
pub trait BridgeHandler: Send + Sync {
    /// The broker connection was (re-)established.
    fn on_connected(&self) -> impl Future<Output = ()> + Send;

    /// An inbound message arrived on a subscribed command topic.
    fn on_command(&self, topic: &str, payload: &[u8]) -> impl Future<Output = ()> + Send;
}

impl<T: DeviceGateway> DeviceGateway for std::sync::Arc<T> {
    fn list_devices(&self) -> impl Future<Output = Result<Vec<HubDevice>, BridgeError>> + Send {
        (**self).list_devices()
    }

    fn device_by_id(
        &self,
        id: u32,
    ) -> impl Future<Output = Result<Option<HubDevice>, BridgeError>> + Send {
        (**self).device_by_id(id)
    }

    fn send_command(
        &self,
        id: u32,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).send_command(id, command)
    }
}

impl<T: BridgeHandler> BridgeHandler for std::sync::Arc<T> {
    fn on_connected(&self) -> impl Future<Output = ()> + Send {
        (**self).on_connected()
    }

    fn on_command(&self, topic: &str, payload: &[u8]) -> impl Future<Output = ()> + Send {
        (**self).on_command(topic, payload)
    }
}
