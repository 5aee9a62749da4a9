//! # LocalStorage - values persisted to a directory.
//!
//! Each key is stored as `<escaped key>.json` under the configured directory. The
//! directory is created on first write. Keys are percent-encoded with `urlencoding`
//! (ASCII alphanumerics and `-_.~` kept), so distinct keys never share a file and no
//! key can name a path outside the directory.
//!
//! Each write goes to its own temporary file and is renamed into place, so
//! concurrent writers of one key never share a temp file and readers never see a
//! partial value.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::state::persistence::{decode, encode, report, StoragePersistence};

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Directory-backed persistent storage.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    /// Stores values under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Removes the value for `key`; returns true if a file was deleted.
    pub async fn remove(&self, key: &str) -> bool {
        let Ok(path) = self.path_for(key) else {
            return false;
        };
        tokio::fs::remove_file(path).await.is_ok()
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.trim().is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.dir.join(format!("{}.json", urlencoding::encode(key))))
    }

    async fn write(&self, key: &str, data: String) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}.{seq}.tmp", std::process::id()));
        let res = match tokio::fs::write(&tmp, data).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(err) => Err(err),
        };
        if res.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        res.map_err(StorageError::from)
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) if data.trim().is_empty() => Ok(None),
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl StoragePersistence for LocalStorage {
    async fn store<T>(&self, key: &str, value: &T)
    where
        T: Serialize + Sync,
    {
        let res = match encode(value) {
            Ok(data) => self.write(key, data).await,
            Err(err) => Err(err),
        };
        if let Err(err) = res {
            report(self.name(), "store", key, &err);
        }
    }

    async fn retrieve<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send,
    {
        let res = match self.read(key).await {
            Ok(Some(data)) => decode(&data).map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        res.unwrap_or_else(|err| {
            report(self.name(), "retrieve", key, &err);
            None
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Cart {
        items: Vec<String>,
    }

    #[test]
    fn test_keys_map_to_distinct_files_in_dir() {
        let store = LocalStorage::new("/state");
        let path = |key: &str| store.path_for(key).unwrap();

        assert_eq!(path("cart"), Path::new("/state/cart.json"));
        assert_eq!(path("app::Cart"), Path::new("/state/app%3A%3ACart.json"));
        assert_ne!(path("a/b"), path("a_b"));
        assert_eq!(path("../x").parent(), Some(Path::new("/state")));
    }

    #[tokio::test]
    async fn test_values_survive_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let cart = Cart {
            items: vec!["apple".into(), "pear".into()],
        };

        LocalStorage::new(dir.path().join("state"))
            .store("cart", &cart)
            .await;

        let reopened = LocalStorage::new(dir.path().join("state"));
        assert_eq!(reopened.retrieve::<Cart>("cart").await, Some(cart));
        assert!(reopened.remove("cart").await);
        assert_eq!(reopened.retrieve::<Cart>("cart").await, None);
    }

    #[tokio::test]
    async fn test_unavailable_medium_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        tokio::fs::write(&blocker, b"file").await.unwrap();

        let store = LocalStorage::new(&blocker);
        store.store("cart", &Cart::default()).await;
        assert_eq!(store.retrieve::<Cart>("cart").await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_of_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStorage::new(dir.path());
        let big = |n: usize| Cart {
            items: vec![format!("item-{n}"); 512],
        };
        store.store("cart", &big(0)).await;

        let mut writers = Vec::new();
        for w in 1..=8 {
            let store = store.clone();
            writers.push(tokio::spawn(async move {
                for round in 0..20 {
                    store.store("cart", &big(w * 100 + round)).await;
                }
            }));
        }
        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut missing = 0;
                for _ in 0..200 {
                    if store.retrieve::<Cart>("cart").await.is_none() {
                        missing += 1;
                    }
                    tokio::task::yield_now().await;
                }
                missing
            })
        };

        for w in writers {
            w.await.unwrap();
        }
        assert_eq!(reader.await.unwrap(), 0);

        let last = store.retrieve::<Cart>("cart").await.unwrap();
        assert_eq!(last.items.len(), 512);

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(files, vec!["cart.json".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_key_and_corrupt_file_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStorage::new(dir.path());

        store.store("  ", &Cart::default()).await;
        assert_eq!(store.retrieve::<Cart>("  ").await, None);

        tokio::fs::write(dir.path().join("cart.json"), b"{oops")
            .await
            .unwrap();
        assert_eq!(store.retrieve::<Cart>("cart").await, None);
    }
}
