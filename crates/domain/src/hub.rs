//! Hub identity — the stable hardware identifiers behind `unique_id`s and
//! the Home Assistant device-registry block.

use serde::{Deserialize, Serialize};

/// Identity of the hub the bridge runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubInfo {
    /// Name shown in Home Assistant and used as the hub topic segment.
    pub name: String,
    /// MAC address without separators, upper case (e.g. `AABBCCDDEEFF`).
    pub mac_compact: String,
    /// MAC address with colon separators, upper case.
    pub mac: String,
    /// Product/model name.
    pub product: String,
    /// Firmware version string.
    pub firmware_version: String,
    /// Link to the hub's own configuration UI, if any.
    pub configuration_url: Option<String>,
}

impl HubInfo {
    /// `unique_id` for an entity belonging to this hub.
    ///
    /// Stable across restarts: derived only from the hardware address and
    /// the entity-local id.
    #[must_use]
    pub fn unique_id(&self, entity_id: &str) -> String {
        format!("{}_{}", self.mac_compact, entity_id)
    }
}

impl Default for HubInfo {
    fn default() -> Self {
        Self {
            name: "hasslink".to_string(),
            mac_compact: String::new(),
            mac: String::new(),
            product: "hasslink".to_string(),
            firmware_version: env!("CARGO_PKG_VERSION").to_string(),
            configuration_url: None,
        }
    }
}
