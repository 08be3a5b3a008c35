//! # hasslink-domain
//!
//! Pure domain model for the hasslink hub-to-Home-Assistant bridge.
//!
//! ## Responsibilities
//! - Define **HubDevice** (the hub's device abstraction: capability bitmask,
//!   declared type, battery metadata, state tuple, sensor channels)
//! - Define **Capabilities** (the hub's method bitmask)
//! - Define **Sensors** (type + scale channels with unit and Home Assistant
//!   class lookups)
//! - Define **DeviceCommand** (commands the bridge can issue back to the hub)
//! - Define **HubInfo** (the stable hardware identity used for unique ids)
//! - Common error conventions
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod capabilities;
pub mod command;
pub mod device;
pub mod error;
pub mod hub;
pub mod sensor;
