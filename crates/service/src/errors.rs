use std::fmt;

use thiserror::Error;

/// Field guarded by a uniqueness rule on the `users` collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Username => f.write_str("Username"),
            UniqueField::Email => f.write_str("Email"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0} already exists")]
    Conflict(UniqueField),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Db(String),
    #[error("kv store error: {0}")]
    Kv(String),
    #[error("collection `{collection}` is unreadable: {reason}")]
    Corrupt { collection: &'static str, reason: String },
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl From<sea_orm::DbErr> for StorageError {
    fn from(e: sea_orm::DbErr) -> Self {
        StorageError::Db(e.to_string())
    }
}

impl From<redis::RedisError> for StorageError {
    fn from(e: redis::RedisError) -> Self {
        StorageError::Kv(e.to_string())
    }
}
