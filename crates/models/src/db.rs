//! Process-wide database handle.
//!
//! The first caller connects; concurrent first callers wait on the same lock and reuse the
//! handle. `shutdown` closes it so the next `shared` call reconnects.

use std::time::Duration;

use configs::DatabaseConfig;
use once_cell::sync::Lazy;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::ModelError;

static SHARED: Lazy<Mutex<Option<DatabaseConnection>>> = Lazy::new(|| Mutex::new(None));

/// Open a dedicated connection pool.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> Result<DatabaseConnection, ModelError> {
    let mut opts = ConnectOptions::new(cfg.url.clone());
    opts.connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .sqlx_logging(cfg.sqlx_logging);
    if cfg.url.contains(":memory:") {
        // every pooled connection would otherwise open its own empty database
        opts.max_connections(1).min_connections(1);
    } else {
        opts.max_connections(cfg.max_connections)
            .min_connections(cfg.min_connections)
            .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs));
    }
    Database::connect(opts).await.map_err(|e| ModelError::Db(e.to_string()))
}

/// Return the shared handle, connecting on first use.
pub async fn shared(cfg: &DatabaseConfig) -> Result<DatabaseConnection, ModelError> {
    let mut slot = SHARED.lock().await;
    if let Some(db) = slot.as_ref() {
        return Ok(db.clone());
    }
    let db = connect_with_config(cfg).await?;
    info!(max_connections = cfg.max_connections, "database connection established");
    *slot = Some(db.clone());
    Ok(db)
}

/// Close the shared handle if one was opened.
pub async fn shutdown() -> Result<(), ModelError> {
    let taken = SHARED.lock().await.take();
    if let Some(db) = taken {
        db.close().await.map_err(|e| ModelError::Db(e.to_string()))?;
        info!("database connection closed");
    }
    Ok(())
}
