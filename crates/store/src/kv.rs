//! The key/value seam behind all persistence.
//!
//! [`KeyValueStore`] keeps storage mechanics out of the record adapters:
//! the same camera/user stores run against the in-memory map in tests and
//! the file-per-key directory store in the daemon.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// An ordered, string-keyed byte store.
///
/// `keys` returns all keys sorted ascending. Writes to the same key are
/// last-writer-wins; callers serialize per-key writers themselves.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Keys become file names in the file store, so path-ish keys are refused
/// uniformly across implementations.
fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.contains(['/', '\\', '\0']) || key == "." || key == ".." {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store used by tests and by the daemon when no data directory
/// is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        self.inner.write().await.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        // BTreeMap iteration is already ascending.
        Ok(self.inner.read().await.keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One file per key under a base directory.
#[derive(Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    /// Open (creating if necessary) a store rooted at `base`.
    pub async fn open(base: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base = base.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&base).await?;
        Ok(Self { base })
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        match tokio::fs::read(self.base.join(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        tokio::fs::write(self.base.join(key), value).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Ok(name) = entry.file_name().into_string() {
                    keys.push(name);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get("0").await.unwrap(), None);
        store.put("0", b"hello").await.unwrap();
        assert_eq!(store.get("0").await.unwrap(), Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn memory_store_keys_are_sorted() {
        let store = MemoryStore::new();
        for key in ["b", "a", "c"] {
            store.put(key, b"x").await.unwrap();
        }
        assert_eq!(store.keys().await.unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn path_like_keys_are_rejected() {
        let store = MemoryStore::new();
        assert_matches!(
            store.put("../escape", b"x").await,
            Err(StoreError::InvalidKey(_))
        );
        assert_matches!(store.get("").await, Err(StoreError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn file_store_round_trips_and_lists() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.put("10", b"ten").await.unwrap();
        store.put("2", b"two").await.unwrap();
        assert_eq!(store.get("10").await.unwrap(), Some(b"ten".to_vec()));
        assert_eq!(store.get("missing").await.unwrap(), None);
        // Lexicographic, like the trait promises; numeric ordering is the
        // camera store's concern.
        assert_eq!(store.keys().await.unwrap(), ["10", "2"]);
    }

    #[tokio::test]
    async fn file_store_overwrites_existing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.put("k", b"v1").await.unwrap();
        store.put("k", b"v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v2".to_vec()));
    }
}
