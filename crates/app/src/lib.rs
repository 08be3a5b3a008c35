//! # hasslink-app
//!
//! Application layer — the bridge engine and its **port definitions**.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `DeviceGateway` — list/resolve hub devices and issue commands
//!   - `PayloadPublisher` — fire-and-forget MQTT publishes
//!   - `ConfigStore` — persisted key/value strings (known-entity set)
//! - **Classify** hub devices into Home Assistant entity kinds
//! - **Name** config/state/command topics deterministically
//! - **Build** discovery payloads and **encode** state payloads per kind
//! - **Route** inbound command payloads back to hub device commands
//! - **Reconcile** the persisted known-entity registry across discovery runs
//!
//! ## Dependency rule
//! Depends on `hasslink-domain` only (plus `tokio::sync` for the registry
//! lock). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod classifier;
pub mod command;
pub mod engine;
pub mod payload;
pub mod ports;
pub mod registry;
pub mod settings;
pub mod state;
pub mod topics;
