use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StoreError};

/// Disk-persistent store backed by a cacache directory.
///
/// Each key maps to one cacache entry holding the JSON-encoded value. The
/// cacache calls are synchronous, so every operation runs on the blocking
/// pool to keep the async runtime free.
#[derive(Debug, Clone)]
pub struct DiskStore {
    path: PathBuf,
}

impl DiskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn read_entry(path: &Path, key: &str) -> Result<Option<Value>, StoreError> {
    // Deleted or never-written keys have no metadata
    if cacache::metadata_sync(path, key)?.is_none() {
        return Ok(None);
    }
    let bytes = cacache::read_sync(path, key)?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}

#[async_trait]
impl KeyValueStore for DiskStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let path = self.path.clone();
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        tokio::task::spawn_blocking(move || -> Result<_, StoreError> {
            let mut found = Map::new();
            for key in keys {
                if let Some(value) = read_entry(&path, &key)? {
                    found.insert(key, value);
                }
            }
            Ok(found)
        })
        .await?
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<_, StoreError> {
            for (key, value) in entries {
                let bytes = serde_json::to_vec(&value)?;
                cacache::write_sync(&path, &key, &bytes)?;
            }
            Ok(())
        })
        .await?
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let path = self.path.clone();
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        tokio::task::spawn_blocking(move || -> Result<_, StoreError> {
            for key in keys {
                cacache::remove_sync(&path, &key)?;
            }
            Ok(())
        })
        .await?
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<_, StoreError> {
            if !path.exists() {
                return Ok(());
            }
            cacache::clear_sync(&path)?;
            Ok(())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one(key: &str, value: Value) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        map
    }

    #[tokio::test]
    async fn test_missing_directory_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path().join("never-created"));

        let got = store.get(&["anything"]).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn test_values_survive_a_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        store
            .set(one("alice", json!([{"id": "1", "url": "https://a.com", "notifyAt": 5}])))
            .await
            .unwrap();

        let reopened = DiskStore::new(dir.path());
        let got = reopened.get(&["alice"]).await.unwrap();
        assert_eq!(got["alice"][0]["url"], json!("https://a.com"));
    }

    #[tokio::test]
    async fn test_remove_hides_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        store.set(one("badgeCount", json!(3))).await.unwrap();

        store.remove(&["badgeCount"]).await.unwrap();
        assert!(store.get(&["badgeCount"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_wipes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path().join("sync"));
        store.set(one("a", json!(1))).await.unwrap();
        store.set(one("b", json!(2))).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.get(&["a", "b"]).await.unwrap().is_empty());
    }
}
