use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::time::timeout;

use crate::error::CollectError;

// Keys are tiny and EXISTS/SET are O(1); anything slower than this means
// the store is in trouble and the line should be skipped.
const DEDUP_TIMEOUT: Duration = Duration::from_millis(1000);

/// Duplicate-suppression boundary: a shared set-membership service.
///
/// `mark` is best-effort from the pipeline's point of view; failing to
/// mark means an already-published line may be published again next
/// cycle, which is the safe failure mode (at-least-once, not
/// exactly-once).
#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn seen(&self, key: &str) -> Result<bool, CollectError>;
    async fn mark(&self, key: &str) -> Result<(), CollectError>;
}

pub struct RedisDedupStore {
    connection: ConnectionManager,
    ttl_seconds: usize,
}

impl RedisDedupStore {
    /// Connects eagerly; the manager reconnects on its own if the
    /// connection drops later, so per-line commands reuse one
    /// multiplexed connection instead of dialing each time.
    ///
    /// `ttl_seconds` bounds how long a key stays marked; `0` keeps keys
    /// forever, matching the original unbounded-retention behavior.
    pub async fn new(addr: String, ttl_seconds: usize) -> Result<RedisDedupStore> {
        let client = redis::Client::open(addr)?;
        let connection = client.get_tokio_connection_manager().await?;

        Ok(RedisDedupStore {
            connection,
            ttl_seconds,
        })
    }
}

fn store_error(err: redis::RedisError) -> CollectError {
    if err.kind() == redis::ErrorKind::AuthenticationFailed {
        CollectError::FatalAuthFailure(err.to_string())
    } else {
        CollectError::DedupStoreUnavailable(err.to_string())
    }
}

fn store_timeout() -> CollectError {
    CollectError::DedupStoreUnavailable("command timed out".to_string())
}

#[async_trait]
impl DedupStore for RedisDedupStore {
    async fn seen(&self, key: &str) -> Result<bool, CollectError> {
        let mut conn = self.connection.clone();

        let exists = conn.exists(key);
        let exists: bool = timeout(DEDUP_TIMEOUT, exists)
            .await
            .map_err(|_| store_timeout())?
            .map_err(store_error)?;

        Ok(exists)
    }

    async fn mark(&self, key: &str) -> Result<(), CollectError> {
        let mut conn = self.connection.clone();

        if self.ttl_seconds > 0 {
            let set = conn.set_ex::<_, _, ()>(key, 0, self.ttl_seconds);
            timeout(DEDUP_TIMEOUT, set)
                .await
                .map_err(|_| store_timeout())?
                .map_err(store_error)?;
        } else {
            let set = conn.set::<_, _, ()>(key, 0);
            timeout(DEDUP_TIMEOUT, set)
                .await
                .map_err(|_| store_timeout())?
                .map_err(store_error)?;
        }

        Ok(())
    }
}

/// In-process store for tests and local runs. Loses all state on
/// restart, so it only suppresses duplicates within one process
/// lifetime.
#[derive(Default)]
pub struct MemoryDedupStore {
    keys: Mutex<HashSet<String>>,
}

impl MemoryDedupStore {
    pub fn new() -> MemoryDedupStore {
        MemoryDedupStore::default()
    }
}

#[async_trait]
impl DedupStore for MemoryDedupStore {
    async fn seen(&self, key: &str) -> Result<bool, CollectError> {
        let keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());

        Ok(keys.contains(key))
    }

    async fn mark(&self, key: &str) -> Result<(), CollectError> {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string());

        Ok(())
    }
}
