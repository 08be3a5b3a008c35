//! Known-entity registry — the persisted set of previously-published
//! discovery entries.
//!
//! The registry is the single source of truth for "what Home Assistant
//! currently believes exists", so removed or changed devices can be
//! retracted instead of leaving orphaned retained configs behind. The
//! whole set is serialized as one ordered JSON array of triples and
//! rewritten atomically on every change — no partial updates.

use serde::{Deserialize, Serialize};

use hasslink_domain::error::BridgeError;

use crate::classifier::EntityKind;
use crate::ports::ConfigStore;

/// Store key holding the serialized triple list.
const STORE_KEY: &str = "known_entities";

/// One previously-published discovery entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    from = "(EntityKind, String, String)",
    into = "(EntityKind, String, String)"
)]
pub struct KnownEntity {
    pub kind: EntityKind,
    /// Owning hub device id, stringified (the hub entity uses `"hub"`).
    pub device_id: String,
    /// Entity-local id.
    pub entity_id: String,
}

impl KnownEntity {
    /// Build a triple from a kind, numeric device id, and entity id.
    #[must_use]
    pub fn new(kind: EntityKind, device_id: u32, entity_id: impl Into<String>) -> Self {
        Self {
            kind,
            device_id: device_id.to_string(),
            entity_id: entity_id.into(),
        }
    }
}

impl From<(EntityKind, String, String)> for KnownEntity {
    fn from((kind, device_id, entity_id): (EntityKind, String, String)) -> Self {
        Self {
            kind,
            device_id,
            entity_id,
        }
    }
}

impl From<KnownEntity> for (EntityKind, String, String) {
    fn from(entity: KnownEntity) -> Self {
        (entity.kind, entity.device_id, entity.entity_id)
    }
}

/// Persisted registry of published entities.
///
/// Exclusively owns the persisted set; callers never touch the store key
/// directly. Not internally synchronized — the engine serializes access
/// behind its own lock (single-writer discipline).
pub struct KnownEntityRegistry<S> {
    store: S,
    entities: Vec<KnownEntity>,
}

impl<S: ConfigStore> KnownEntityRegistry<S> {
    /// Load the persisted set, defaulting to empty.
    ///
    /// A malformed persisted string is treated as empty (with a warning)
    /// rather than an error: the next successful discovery run rewrites it.
    pub async fn load(store: S) -> Self {
        let entities = match store.get(STORE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(entities) => entities,
                Err(error) => {
                    tracing::warn!(%error, "discarding malformed known-entity set");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::warn!(%error, "failed to read known-entity set, starting empty");
                Vec::new()
            }
        };
        Self { store, entities }
    }

    /// Whether the triple has already been published.
    #[must_use]
    pub fn contains(&self, kind: EntityKind, device_id: &str, entity_id: &str) -> bool {
        self.entities.iter().any(|entity| {
            entity.kind == kind && entity.device_id == device_id && entity.entity_id == entity_id
        })
    }

    /// Current set, in publish order.
    #[must_use]
    pub fn snapshot(&self) -> &[KnownEntity] {
        &self.entities
    }

    /// Record one newly-published entity and persist.
    pub async fn insert(&mut self, entity: KnownEntity) {
        if !self.entities.contains(&entity) {
            self.entities.push(entity);
            self.persist().await;
        }
    }

    /// Drop every entity owned by `device_id`, returning the removed
    /// triples for retraction.
    pub async fn remove_device(&mut self, device_id: &str) -> Vec<KnownEntity> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .entities
            .drain(..)
            .partition(|entity| entity.device_id == device_id);
        self.entities = kept;
        if !removed.is_empty() {
            self.persist().await;
        }
        removed
    }

    /// Replace the whole set with `new_set`, returning the triples that
    /// were present before but are gone now (to be retracted).
    ///
    /// Idempotent: swapping in the same set twice returns an empty
    /// removed-list the second time.
    pub async fn diff_and_swap(&mut self, new_set: Vec<KnownEntity>) -> Vec<KnownEntity> {
        let removed: Vec<KnownEntity> = self
            .entities
            .iter()
            .filter(|old| !new_set.contains(old))
            .cloned()
            .collect();
        self.entities = new_set;
        self.persist().await;
        removed
    }

    /// Persist the current set, keeping the in-memory view as best-effort
    /// truth when the store fails.
    async fn persist(&self) {
        let serialized = match serde_json::to_string(&self.entities) {
            Ok(serialized) => serialized,
            Err(error) => {
                tracing::error!(%error, "failed to serialize known-entity set");
                return;
            }
        };
        if let Err(error) = self.store.set(STORE_KEY, &serialized).await {
            tracing::warn!(%error, "failed to persist known-entity set");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct MemoryStore {
        values: Arc<Mutex<HashMap<String, String>>>,
    }

    impl ConfigStore for MemoryStore {
        fn get(
            &self,
            key: &str,
        ) -> impl Future<Output = Result<Option<String>, BridgeError>> + Send {
            let value = self.values.lock().unwrap().get(key).cloned();
            async move { Ok(value) }
        }

        fn set(
            &self,
            key: &str,
            value: &str,
        ) -> impl Future<Output = Result<(), BridgeError>> + Send {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            async { Ok(()) }
        }
    }

    fn triple(kind: EntityKind, device_id: u32, entity_id: &str) -> KnownEntity {
        KnownEntity::new(kind, device_id, entity_id)
    }

    #[tokio::test]
    async fn should_start_empty_without_persisted_state() {
        let registry = KnownEntityRegistry::load(MemoryStore::default()).await;
        assert!(registry.snapshot().is_empty());
    }

    #[tokio::test]
    async fn should_persist_inserts_and_reload_them() {
        let store = MemoryStore::default();
        let mut registry = KnownEntityRegistry::load(store.clone()).await;
        registry
            .insert(triple(EntityKind::Switch, 12, "12"))
            .await;
        registry
            .insert(triple(EntityKind::Sensor, 12, "12_battery"))
            .await;

        let reloaded = KnownEntityRegistry::load(store).await;
        assert_eq!(reloaded.snapshot().len(), 2);
        assert!(reloaded.contains(EntityKind::Switch, "12", "12"));
        assert!(reloaded.contains(EntityKind::Sensor, "12", "12_battery"));
    }

    #[tokio::test]
    async fn should_not_duplicate_inserts() {
        let mut registry = KnownEntityRegistry::load(MemoryStore::default()).await;
        registry.insert(triple(EntityKind::Switch, 12, "12")).await;
        registry.insert(triple(EntityKind::Switch, 12, "12")).await;
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn should_serialize_as_ordered_triples() {
        let store = MemoryStore::default();
        let mut registry = KnownEntityRegistry::load(store.clone()).await;
        registry.insert(triple(EntityKind::Switch, 12, "12")).await;

        let raw = store.values.lock().unwrap().get(STORE_KEY).cloned().unwrap();
        assert_eq!(raw, r#"[["switch","12","12"]]"#);
    }

    #[tokio::test]
    async fn should_remove_all_entities_of_a_device() {
        let mut registry = KnownEntityRegistry::load(MemoryStore::default()).await;
        registry.insert(triple(EntityKind::Light, 9, "9")).await;
        registry
            .insert(triple(EntityKind::Sensor, 9, "9_battery"))
            .await;
        registry.insert(triple(EntityKind::Switch, 2, "2")).await;

        let removed = registry.remove_device("9").await;
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.snapshot().len(), 1);
        assert!(registry.contains(EntityKind::Switch, "2", "2"));
    }

    #[tokio::test]
    async fn should_diff_and_swap_returning_removed_triples() {
        let mut registry = KnownEntityRegistry::load(MemoryStore::default()).await;
        registry.insert(triple(EntityKind::Switch, 12, "12")).await;
        registry.insert(triple(EntityKind::Light, 9, "9")).await;

        let new_set = vec![triple(EntityKind::Light, 9, "9")];
        let removed = registry.diff_and_swap(new_set.clone()).await;
        assert_eq!(removed, vec![triple(EntityKind::Switch, 12, "12")]);

        // Idempotent: same set again removes nothing.
        let removed = registry.diff_and_swap(new_set).await;
        assert!(removed.is_empty());
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn should_recover_from_malformed_persisted_state() {
        let store = MemoryStore::default();
        store
            .values
            .lock()
            .unwrap()
            .insert(STORE_KEY.to_string(), "not json".to_string());
        let registry = KnownEntityRegistry::load(store).await;
        assert!(registry.snapshot().is_empty());
    }
}
