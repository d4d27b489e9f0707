use async_trait::async_trait;
use configs::Backend;
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use redis::AsyncCommands;
use serde_json::Value;
use tracing::info;

use super::{Collection, CollectionStore};
use crate::errors::StorageError;

/// Redis-backed collection documents with connection pooling.
///
/// Each collection is one string key (`<prefix>:<collection>`) holding the JSON array.
/// The per-collection mutex in `CollectionStorage` only serialises writers inside this
/// process; several server processes sharing one Redis still race on read-modify-write.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisStore {
    /// Create a pool for `url`. No connection is opened until the first command.
    pub fn new(url: &str, key_prefix: impl Into<String>) -> Result<Self, StorageError> {
        let pool = PoolConfig::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StorageError::Kv(format!("failed to create Redis pool: {e}")))?;
        Ok(Self { pool, key_prefix: key_prefix.into() })
    }

    fn key(&self, collection: Collection) -> String {
        if self.key_prefix.is_empty() {
            collection.name().to_string()
        } else {
            format!("{}:{}", self.key_prefix, collection.name())
        }
    }

    async fn conn(&self) -> Result<Connection, StorageError> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::Kv(format!("failed to get connection from pool: {e}")))
    }
}

#[async_trait]
impl CollectionStore for RedisStore {
    fn backend(&self) -> Backend {
        Backend::Redis
    }

    async fn read(&self, collection: Collection) -> Result<Option<Vec<Value>>, StorageError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(self.key(collection)).await?;
        raw.map(|s| {
            serde_json::from_str(&s)
                .map_err(|e| StorageError::Corrupt { collection: collection.name(), reason: e.to_string() })
        })
        .transpose()
    }

    async fn write(&self, collection: Collection, records: &[Value]) -> Result<(), StorageError> {
        let data = serde_json::to_string(records)?;
        let mut conn = self.conn().await?;
        let _: () = conn.set(self.key(collection), data).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close();
        info!("redis pool closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CollectionStorage, Seeds, Storage};
    use serde_json::json;

    /// Live Redis is optional; set `REDIS_URL` to run these.
    fn redis_url() -> Option<String> {
        std::env::var("REDIS_URL").ok()
    }

    #[test]
    fn keys_are_prefixed() {
        let store = RedisStore::new("redis://127.0.0.1:6379", "bank").unwrap();
        assert_eq!(store.key(Collection::Users), "bank:users");
        let bare = RedisStore::new("redis://127.0.0.1:6379", "").unwrap();
        assert_eq!(bare.key(Collection::CheckDeposits), "checkdeposits");
    }

    #[tokio::test]
    async fn closed_pool_reports_kv_errors() -> Result<(), anyhow::Error> {
        // pool creation and close need no server
        let store = RedisStore::new("redis://127.0.0.1:6379", "bank")?;
        store.close().await?;
        assert!(matches!(store.conn().await, Err(StorageError::Kv(_))));
        assert!(matches!(store.read(Collection::Users).await, Err(StorageError::Kv(_))));
        assert!(matches!(store.write(Collection::Users, &[]).await, Err(StorageError::Kv(_))));
        Ok(())
    }

    #[tokio::test]
    async fn redis_store_round_trips() -> Result<(), anyhow::Error> {
        let Some(url) = redis_url() else {
            eprintln!("skip: REDIS_URL not set");
            return Ok(());
        };
        let store = RedisStore::new(&url, format!("bank_test_{}", uuid::Uuid::new_v4()))?;
        assert!(store.read(Collection::MoneyFlow).await?.is_none());
        let records = vec![json!({"id": "a", "status": "pending"})];
        store.write(Collection::MoneyFlow, &records).await?;
        assert_eq!(store.read(Collection::MoneyFlow).await?, Some(records));

        let storage = CollectionStorage::new(store, Seeds::new(None, true));
        assert_eq!(storage.list_users().await?.len(), 2);

        let mut conn = storage.store().conn().await?;
        for collection in Collection::ALL {
            let _: () = conn.del(storage.store().key(collection)).await?;
        }
        drop(conn);
        storage.shutdown().await?;
        Ok(())
    }
}
