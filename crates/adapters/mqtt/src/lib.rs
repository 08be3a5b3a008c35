//! # hasslink-adapter-mqtt
//!
//! MQTT transport adapter — owns the rumqttc connection and drives the
//! bridge engine from broker events.
//!
//! ## How it works
//!
//! [`connect`] builds an [`rumqttc::AsyncClient`] with a retained
//! last-will (`offline` on the availability topic) so Home Assistant marks
//! every entity unavailable the moment the bridge drops off the broker.
//! [`run_event_loop`] polls the connection: each `ConnAck` re-subscribes
//! the command filters and notifies the engine, each inbound publish is
//! forwarded as a command. Reconnection itself is rumqttc's job.
//!
//! ## Dependency rule
//! Depends on `hasslink-app` (ports) and `hasslink-domain`; the engine
//! never sees rumqttc types.

mod config;
mod error;

pub use config::MqttConfig;
pub use error::MqttError;

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};

use hasslink_app::ports::{BridgeHandler, PayloadPublisher};

/// Delay before re-polling after a connection error, leaving rumqttc room
/// to back off instead of spinning.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

fn mqtt_options(config: &MqttConfig, availability_topic: &str) -> MqttOptions {
    let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    options.set_last_will(LastWill::new(
        availability_topic,
        "offline",
        QoS::AtLeastOnce,
        true,
    ));
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username.clone(), password.clone());
    }
    options
}

/// Build the broker connection with a retained `offline` last-will.
#[must_use]
pub fn connect(config: &MqttConfig, availability_topic: &str) -> (AsyncClient, EventLoop) {
    AsyncClient::new(mqtt_options(config, availability_topic), 64)
}

/// Fire-and-forget publisher over the shared client.
///
/// Publish failures only mean the request queue is gone (shutdown in
/// progress); they are logged and swallowed.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    #[must_use]
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl PayloadPublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &str, retain: bool) {
        if let Err(error) = self
            .client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(MqttError::Client)
        {
            tracing::warn!(topic, %error, "publish dropped");
        }
    }
}

async fn subscribe_filters(client: &AsyncClient, filters: &[String]) -> Result<(), MqttError> {
    for filter in filters {
        client
            .subscribe(filter.clone(), QoS::AtLeastOnce)
            .await
            .map_err(MqttError::Client)?;
    }
    Ok(())
}

/// Drive the connection until the request queue closes.
///
/// Subscriptions are re-issued on every `ConnAck` because the broker
/// forgets them across clean-session reconnects.
pub async fn run_event_loop<H: BridgeHandler>(
    mut eventloop: EventLoop,
    client: AsyncClient,
    command_filters: [String; 2],
    handler: H,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("broker connection established");
                if let Err(error) = subscribe_filters(&client, &command_filters).await {
                    tracing::warn!(%error, "command subscription failed");
                }
                handler.on_connected().await;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handler.on_command(&publish.topic, &publish.payload).await;
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "connection error");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
