//! File-backed configuration store.
//!
//! A single JSON object file holding string values by key. Reads and
//! writes go through `tokio::fs`; the whole file is rewritten on every
//! `set` so a crash can never leave a half-written key behind a valid one.

use std::collections::BTreeMap;
use std::path::PathBuf;

use hasslink_app::ports::ConfigStore;
use hasslink_domain::error::BridgeError;

/// Key/value strings persisted as one JSON object file.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, BridgeError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(BridgeError::from),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(BridgeError::store(err)),
        }
    }
}

impl ConfigStore for FileConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BridgeError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        let content = serde_json::to_string_pretty(&values)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(BridgeError::store)
    }
}
