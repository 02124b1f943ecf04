//! Blob store interface
//!
//! The insight store persists its entire aggregate as one serialized text
//! value under a single logical key. The backend is pluggable: the default
//! is one JSON file per key under a data directory, and an in-memory
//! implementation backs tests and ephemeral sessions.

use super::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Durable key-value storage for serialized blobs
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the value under `key`, or `None` when nothing is stored yet
    async fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Durably replace the value under `key`
    async fn write(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// File-backed blob store: one `<key>.json` file per key
///
/// Writes go through a temp file and rename so a crash mid-write never
/// leaves a truncated blob behind.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Create a file store rooted at `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory blobs are stored under
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(key = %key, path = ?path, bytes = value.len(), "Blob persisted");
        Ok(())
    }
}

/// In-memory blob store for tests and ephemeral use
///
/// `fail_writes` simulates a broken backend to exercise error paths.
#[derive(Default)]
pub struct MemoryBlobStore {
    data: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryBlobStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with one key
    pub fn with_contents(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut data = HashMap::new();
        data.insert(key.into(), value.into());
        Self {
            data: RwLock::new(data),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Blob("simulated write failure".to_string()));
        }
        self.data
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
