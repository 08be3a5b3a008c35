//! Bridge settings — the immutable configuration snapshot an engine runs
//! with.

use hasslink_domain::hub::HubInfo;

use crate::topics::TopicScheme;

/// Snapshot of everything the engine needs to name topics and build
/// payloads. Taken once at wiring time; a configuration change means a
/// new engine, never a mid-run mutation.
#[derive(Debug, Clone, Default)]
pub struct BridgeSettings {
    /// Topic derivation scheme.
    pub topics: TopicScheme,
    /// Hub hardware identity.
    pub hub: HubInfo,
    /// Whether state publishes are retained (discovery configs always are).
    pub retain: bool,
    /// Emit per-device `via_device` registry blocks so Home Assistant
    /// groups entities under their physical device instead of the hub.
    pub use_via_device: bool,
}
