//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the server prepares directories only for the
//! backend that actually needs them.

use std::path::Path;

use configs::{Backend, StorageConfig};

/// Ensure the file backend's data directory exists; other backends need nothing on disk.
pub async fn ensure_env(cfg: &StorageConfig) -> anyhow::Result<()> {
    if cfg.backend != Backend::File {
        return Ok(());
    }
    common::env::ensure_env(Path::new(&cfg.data_dir), cfg.seed_dir.as_deref().map(Path::new)).await
}
