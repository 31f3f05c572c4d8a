//! In-Memory Snapshot Storage
//!
//! Stores serialized snapshots in a map. Useful for testing and
//! development; the write counter lets tests assert how many times the
//! dispatch loop persisted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::ClientId;
use crate::ports::snapshot_storage::{SnapshotStorage, StorageError};

/// In-memory storage for conversation snapshots.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    entries: Arc<RwLock<HashMap<ClientId, Vec<u8>>>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Total number of `put` calls since construction.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStorage for InMemoryStorage {
    async fn has(&self, key: &ClientId) -> Result<bool, StorageError> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn get(&self, key: &ClientId) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &ClientId, value: &[u8]) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.clone(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self, key: &ClientId) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
