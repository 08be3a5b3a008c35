//! # hasslinkd — bridge daemon
//!
//! Composition root that wires the hub gateway, MQTT transport, and
//! bridge engine together and runs until shutdown.
//!
//! ## Responsibilities
//! - Parse configuration (`hasslink.toml` + env vars)
//! - Initialize tracing
//! - Construct the device gateway, publisher, and known-entity store
//! - Build the bridge engine and hand it to the MQTT event loop
//! - Handle graceful shutdown (SIGINT): retract entities, go offline
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no bridge logic belongs here.

mod config;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use hasslink_adapter_mqtt::MqttPublisher;
use hasslink_adapter_virtual::VirtualHub;
use hasslink_app::engine::BridgeEngine;
use hasslink_app::registry::KnownEntityRegistry;

use config::Config;
use store::FileConfigStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = config.bridge_settings();
    tracing::info!(
        broker = %config.mqtt.host,
        port = config.mqtt.port,
        hub = %settings.topics.hub_name,
        "starting bridge"
    );

    let (client, eventloop) =
        hasslink_adapter_mqtt::connect(&config.mqtt, &settings.topics.availability_topic());
    let publisher = MqttPublisher::new(client.clone());

    let store = FileConfigStore::new(&config.bridge.state_file);
    let registry = KnownEntityRegistry::load(store).await;

    let command_filters = settings.topics.command_filters();
    let engine = Arc::new(BridgeEngine::new(
        VirtualHub::default(),
        publisher,
        registry,
        settings,
    ));

    let network = tokio::spawn(hasslink_adapter_mqtt::run_event_loop(
        eventloop,
        client,
        command_filters,
        Arc::clone(&engine),
    ));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    engine.shutdown().await;
    // Leave the event loop a moment to flush the retraction publishes.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    network.abort();

    Ok(())
}
