pub mod disk;
pub mod error;
pub mod memory;

pub use disk::DiskStore;
pub use error::StoreError;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A key-value store holding JSON-serializable values.
///
/// Multi-key calls are not atomic. Keys absent from the store are simply
/// left out of the map returned by `get`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;
    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError>;
    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Read a single key and decode it, returning None when the key is absent
pub async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let mut found = store.get(&[key]).await?;
    match found.remove(key) {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encode a value and write it under a single key
pub async fn save<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let mut entries = Map::new();
    entries.insert(key.to_string(), serde_json::to_value(value)?);
    store.set(entries).await
}

/// The two storage tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreArea {
    /// Scoped to this device
    Local,
    /// Replicated across the user's signed-in devices
    Sync,
}

impl StoreArea {
    pub fn dir_name(&self) -> &'static str {
        match self {
            StoreArea::Local => "local",
            StoreArea::Sync => "sync",
        }
    }
}

impl fmt::Display for StoreArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Handles to both storage tiers, injected into the components that need them
#[derive(Clone)]
pub struct Stores {
    pub local: Arc<dyn KeyValueStore>,
    pub sync: Arc<dyn KeyValueStore>,
}

impl Stores {
    /// Two independent in-memory tiers
    pub fn memory() -> Self {
        Self {
            local: Arc::new(MemoryStore::new()),
            sync: Arc::new(MemoryStore::new()),
        }
    }

    /// Two cacache directories under `root`: `root/local` and `root/sync`
    pub fn disk(root: &Path) -> Self {
        Self {
            local: Arc::new(DiskStore::new(root.join(StoreArea::Local.dir_name()))),
            sync: Arc::new(DiskStore::new(root.join(StoreArea::Sync.dir_name()))),
        }
    }

    pub fn area(&self, area: StoreArea) -> &Arc<dyn KeyValueStore> {
        match area {
            StoreArea::Local => &self.local,
            StoreArea::Sync => &self.sync,
        }
    }

    pub async fn get_local(&self, key: &str) -> Result<Option<Value>, StoreError> {
        load(self.local.as_ref(), key).await
    }

    pub async fn set_local(&self, key: &str, value: Value) -> Result<(), StoreError> {
        save(self.local.as_ref(), key, &value).await
    }

    pub async fn get_sync(&self, key: &str) -> Result<Option<Value>, StoreError> {
        load(self.sync.as_ref(), key).await
    }

    pub async fn set_sync(&self, key: &str, value: Value) -> Result<(), StoreError> {
        save(self.sync.as_ref(), key, &value).await
    }

    /// Wipe both tiers
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        self.local.clear().await?;
        self.sync.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_tiers_are_independent() {
        let stores = Stores::memory();
        stores.set_local("theme", json!("dark")).await.unwrap();

        assert_eq!(stores.get_local("theme").await.unwrap(), Some(json!("dark")));
        assert_eq!(stores.get_sync("theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_and_save_typed() {
        let stores = Stores::memory();
        save(stores.sync.as_ref(), "count", &7i64).await.unwrap();

        let count: Option<i64> = load(stores.sync.as_ref(), "count").await.unwrap();
        assert_eq!(count, Some(7));
    }

    #[tokio::test]
    async fn test_load_wrong_shape_is_an_error() {
        let stores = Stores::memory();
        stores.set_sync("count", json!("seven")).await.unwrap();

        let result: Result<Option<i64>, _> = load(stores.sync.as_ref(), "count").await;
        assert!(matches!(result, Err(StoreError::Serde(_))));
    }

    #[tokio::test]
    async fn test_clear_all() {
        let stores = Stores::memory();
        stores.set_local("a", json!(1)).await.unwrap();
        stores.set_sync("b", json!(2)).await.unwrap();

        stores.clear_all().await.unwrap();
        assert_eq!(stores.get_local("a").await.unwrap(), None);
        assert_eq!(stores.get_sync("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disk_tiers_use_separate_directories() {
        let dir = tempfile::tempdir().unwrap();
        let stores = Stores::disk(dir.path());
        stores.set_sync("k", json!(true)).await.unwrap();

        assert!(dir.path().join("sync").exists());
        assert_eq!(stores.get_local("k").await.unwrap(), None);
        assert_eq!(StoreArea::Sync.to_string(), "sync");
    }
}
