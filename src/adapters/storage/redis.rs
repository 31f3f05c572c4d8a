//! Redis-backed snapshot storage for production deployments.
//!
//! Snapshots are stored as plain string values under a shared key prefix
//! so that unrelated data in the same Redis instance is never touched by
//! `clear_all`.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::ClientId;
use crate::ports::snapshot_storage::{SnapshotStorage, StorageError};

const KEY_PREFIX: &str = "colloquy:snapshot:";

/// Redis-backed storage for conversation snapshots.
///
/// Holds a multiplexed connection, so clones are cheap and share one
/// underlying socket.
#[derive(Clone)]
pub struct RedisStorage {
    conn: MultiplexedConnection,
}

impl RedisStorage {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn redis_key(key: &ClientId) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

fn backend_err(e: redis::RedisError) -> StorageError {
    StorageError::Backend(e.to_string())
}

#[async_trait]
impl SnapshotStorage for RedisStorage {
    async fn has(&self, key: &ClientId) -> Result<bool, StorageError> {
        let mut conn = self.conn.clone();
        conn.exists(Self::redis_key(key)).await.map_err(backend_err)
    }

    async fn get(&self, key: &ClientId) -> Result<Option<Vec<u8>>, StorageError> {
        let mut conn = self.conn.clone();
        conn.get(Self::redis_key(key)).await.map_err(backend_err)
    }

    async fn put(&self, key: &ClientId, value: &[u8]) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(Self::redis_key(key), value)
            .await
            .map_err(backend_err)
    }

    async fn clear(&self, key: &ClientId) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::redis_key(key))
            .await
            .map_err(backend_err)
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn
            .keys(format!("{KEY_PREFIX}*"))
            .await
            .map_err(backend_err)?;
        if !keys.is_empty() {
            conn.del::<_, ()>(keys).await.map_err(backend_err)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStorage").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    // Note: Redis integration tests require a running Redis instance
    // and are typically run separately from unit tests.
    //
    // Example test setup:
    //
    // #[tokio::test]
    // #[ignore] // Run with: cargo test -- --ignored
    // async fn snapshot_round_trip() {
    //     let client = redis::Client::open("redis://127.0.0.1/").unwrap();
    //     let conn = client.get_multiplexed_tokio_connection().await.unwrap();
    //     let storage = RedisStorage::new(conn);
    //     // ... test code
    // }
}
