//! Storage adapters for the three bank collections.
//!
//! Every backend implements [`Storage`]; the router only ever sees `Arc<dyn Storage>`.
//! - `json_file`: one JSON document per collection on disk
//! - `redis_kv`: one JSON value per collection in Redis
//! - `sql`: one table per collection through SeaORM
//!
//! The document backends share [`collection::CollectionStorage`], which serialises each
//! collection behind its own async mutex so read-modify-write cycles never interleave
//! inside one process.

pub mod collection;
pub mod json_file;
pub mod redis_kv;
pub mod seed;
pub mod sql;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use configs::{Backend, StorageConfig};
use models::{CheckDeposit, MoneyFlow, User};
use serde_json::Value;
use tracing::info;

pub use crate::errors::{StorageError, UniqueField};

pub use collection::{CollectionStorage, CollectionStore};
pub use json_file::JsonFileStore;
pub use redis_kv::RedisStore;
pub use seed::Seeds;
pub use sql::SqlStorage;

/// One of the named record sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    MoneyFlow,
    CheckDeposits,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Users, Collection::MoneyFlow, Collection::CheckDeposits];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::MoneyFlow => "moneyflow",
            Collection::CheckDeposits => "checkdeposits",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

/// In-place edit applied to a single user while the adapter holds it exclusively.
pub type UserPatch = Box<dyn FnOnce(&mut User) -> Result<(), StorageError> + Send>;

/// Outcome of the idempotent setup operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupReport {
    pub backend: Backend,
    /// Users written by this run; zero once the collection already had state.
    pub seeded_users: usize,
}

#[async_trait]
pub trait Storage: Send + Sync {
    fn backend(&self) -> Backend;

    /// Create whatever the backend needs and seed empty collections. Safe to call repeatedly.
    async fn setup(&self) -> Result<SetupReport, StorageError>;

    async fn list_users(&self) -> Result<Vec<User>, StorageError>;
    async fn find_user(&self, username: &str) -> Result<Option<User>, StorageError>;
    /// First user whose username or email equals `identifier` and whose password matches.
    async fn find_login(&self, identifier: &str, password: &str) -> Result<Option<User>, StorageError>;
    /// Insert a new user; fails with [`StorageError::Conflict`] on a taken username, then email.
    async fn insert_user(&self, user: User) -> Result<User, StorageError>;
    /// Apply `patch` to the user and persist the result. `None` when no such user exists.
    async fn update_user(&self, username: &str, patch: UserPatch) -> Result<Option<User>, StorageError>;
    async fn delete_user(&self, username: &str) -> Result<bool, StorageError>;

    async fn list_flows(&self) -> Result<Vec<MoneyFlow>, StorageError>;
    async fn insert_flow(&self, flow: MoneyFlow) -> Result<MoneyFlow, StorageError>;
    async fn update_flow_status(&self, id: &str, status: Value) -> Result<Option<MoneyFlow>, StorageError>;
    async fn delete_flow(&self, id: &str) -> Result<bool, StorageError>;

    async fn list_checks(&self) -> Result<Vec<CheckDeposit>, StorageError>;
    async fn insert_check(&self, check: CheckDeposit) -> Result<CheckDeposit, StorageError>;
    async fn update_check_status(&self, id: &str, status: Value) -> Result<Option<CheckDeposit>, StorageError>;
    async fn delete_check(&self, id: &str) -> Result<bool, StorageError>;

    /// Release pooled connections. The adapter must not be used afterwards.
    async fn shutdown(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Build the adapter selected by configuration.
pub async fn build(cfg: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
    let seeds = Seeds::new(cfg.seed_dir.as_ref().map(PathBuf::from), cfg.demo_users);
    let storage: Arc<dyn Storage> = match cfg.backend {
        Backend::File => {
            let store = JsonFileStore::new(&cfg.data_dir).await?;
            Arc::new(CollectionStorage::new(store, seeds))
        }
        Backend::Redis => {
            let store = RedisStore::new(&cfg.redis_url, cfg.key_prefix.clone())?;
            Arc::new(CollectionStorage::new(store, seeds))
        }
        Backend::Sql => Arc::new(SqlStorage::connect(&cfg.database, seeds).await?),
    };
    info!(backend = storage.backend().as_str(), "storage adapter ready");
    Ok(storage)
}
