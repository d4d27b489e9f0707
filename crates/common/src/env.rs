//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the data directory exists; warn when the optional seed directory is missing.
pub async fn ensure_env(data_dir: &Path, seed_dir: Option<&Path>) -> anyhow::Result<()> {
    if let Some(seed_dir) = seed_dir {
        if tokio::fs::metadata(seed_dir).await.is_err() {
            warn!(seed_dir = %seed_dir.display(), "seed directory not found; collections start empty");
        }
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;
    info!(data_dir = %data_dir.display(), "data directory ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_data_dir() -> anyhow::Result<()> {
        let stamp = crate::ids::uniqid();
        let dir = std::env::temp_dir().join(format!("bank_env_{stamp}")).join("nested");
        ensure_env(&dir, Some(Path::new("/definitely/not/here"))).await?;
        assert!(tokio::fs::metadata(&dir).await?.is_dir());
        let _ = tokio::fs::remove_dir_all(dir.parent().unwrap()).await;
        Ok(())
    }
}
