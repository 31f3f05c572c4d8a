//! Snapshot Storage Port - persistence for conversation snapshots.
//!
//! The backend contract is a byte-oriented key/value store keyed by client
//! id. [`SnapshotRepository`] layers the snapshot wire format on top:
//! serialize/deserialize plus the timestamp refresh every persist performs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::conversation::StateData;
use crate::domain::foundation::ClientId;

/// Errors that can occur during snapshot storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("failed to serialize snapshot: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    #[error("failed to deserialize snapshot: {0}")]
    DeserializationFailed(#[source] serde_json::Error),
}

/// Port for durable or in-memory key/value persistence of serialized
/// snapshots.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// True if a snapshot exists for `key`.
    async fn has(&self, key: &ClientId) -> Result<bool, StorageError>;

    /// Returns the stored bytes for `key`, or `None` if absent.
    async fn get(&self, key: &ClientId) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` under `key`, replacing any previous snapshot.
    async fn put(&self, key: &ClientId, value: &[u8]) -> Result<(), StorageError>;

    /// Removes the snapshot for `key`.
    async fn clear(&self, key: &ClientId) -> Result<(), StorageError>;

    /// Removes every stored snapshot.
    async fn clear_all(&self) -> Result<(), StorageError>;
}

/// Wraps a [`SnapshotStorage`] backend with the snapshot wire format.
#[derive(Clone)]
pub struct SnapshotRepository {
    backend: Arc<dyn SnapshotStorage>,
}

impl SnapshotRepository {
    pub fn new(backend: Arc<dyn SnapshotStorage>) -> Self {
        Self { backend }
    }

    /// Loads and deserializes the snapshot for `client_id`.
    ///
    /// An unreadable snapshot is logged and reported as absent: the caller
    /// starts the conversation fresh rather than aborting the dispatch.
    pub async fn fetch(&self, client_id: &ClientId) -> Result<Option<StateData>, StorageError> {
        let Some(bytes) = self.backend.get(client_id).await? else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!(
                    client_id = %client_id,
                    error = %e,
                    "unreadable snapshot, resetting conversation state"
                );
                Ok(None)
            }
        }
    }

    /// Refreshes the snapshot's last-interaction time, serializes it, and
    /// stores it under `client_id`.
    pub async fn persist(
        &self,
        client_id: &ClientId,
        data: &mut StateData,
    ) -> Result<(), StorageError> {
        data.reset_elapsed_time();
        let bytes = serde_json::to_vec(data).map_err(StorageError::SerializationFailed)?;
        self.backend.put(client_id, &bytes).await
    }
}

impl std::fmt::Debug for SnapshotRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotRepository").finish_non_exhaustive()
    }
}
