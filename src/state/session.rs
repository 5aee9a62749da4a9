//! # SessionStorage - values kept for the lifetime of the process.
//!
//! An in-memory map of encoded values. Cloning shares the same map, so one
//! session can be handed to several state managers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::state::persistence::{decode, encode, report, StoragePersistence};

/// In-memory, process-lifetime storage.
#[derive(Clone, Debug, Default)]
pub struct SessionStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionStorage {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// True if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Removes `key`; returns true if it was present.
    pub async fn remove(&self, key: &str) -> bool {
        self.items.write().await.remove(key).is_some()
    }

    /// Removes everything.
    pub async fn clear(&self) {
        self.items.write().await.clear();
    }
}

#[async_trait]
impl StoragePersistence for SessionStorage {
    async fn store<T>(&self, key: &str, value: &T)
    where
        T: Serialize + Sync,
    {
        match encode(value) {
            Ok(data) => {
                self.items.write().await.insert(key.to_string(), data);
            }
            Err(err) => report(self.name(), "store", key, &err),
        }
    }

    async fn retrieve<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send,
    {
        let data = self.items.read().await.get(key).cloned()?;
        match decode(&data) {
            Ok(value) => Some(value),
            Err(err) => {
                report(self.name(), "retrieve", key, &err);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "session"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        font: u8,
    }

    #[tokio::test]
    async fn test_store_then_retrieve() {
        let s = SessionStorage::new();
        let prefs = Prefs {
            theme: "dark".into(),
            font: 14,
        };
        s.store("prefs", &prefs).await;

        assert_eq!(s.retrieve::<Prefs>("prefs").await, Some(prefs));
        assert_eq!(s.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_and_undecodable_are_none() {
        let s = SessionStorage::new();
        assert_eq!(s.retrieve::<Prefs>("nope").await, None);

        s.store("prefs", &"not an object").await;
        assert_eq!(s.retrieve::<Prefs>("prefs").await, None);

        assert!(s.remove("prefs").await);
        assert!(s.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let a = SessionStorage::new();
        let b = a.clone();
        a.store("n", &7u32).await;
        assert_eq!(b.retrieve::<u32>("n").await, Some(7));
        b.clear().await;
        assert!(a.is_empty().await);
    }
}
