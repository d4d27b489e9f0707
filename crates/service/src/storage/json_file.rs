use std::path::PathBuf;

use async_trait::async_trait;
use configs::Backend;
use serde_json::Value;
use tokio::fs;

use super::{Collection, CollectionStore};
use crate::errors::StorageError;

/// Directory of JSON documents, one array per collection (`users.json`, `moneyflow.json`,
/// `checkdeposits.json`).
///
/// Writes go to a sibling temp file that is then renamed over the document, so a reader
/// sees either the old or the new array, never a partial one.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Initialize the store under `dir`, creating the directory if missing.
    pub async fn new<P: Into<PathBuf>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    fn backend(&self) -> Backend {
        Backend::File
    }

    async fn read(&self, collection: Collection) -> Result<Option<Vec<Value>>, StorageError> {
        let bytes = match fs::read(self.path(collection)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(Vec::new()));
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupt { collection: collection.name(), reason: e.to_string() })
    }

    async fn write(&self, collection: Collection, records: &[Value]) -> Result<(), StorageError> {
        let path = self.path(collection);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(records)?;
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("json_file_store_{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn json_file_store_round_trips() -> Result<(), anyhow::Error> {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir).await?;

        // nothing persisted yet
        assert!(store.read(Collection::Users).await?.is_none());

        let records = vec![json!({"id": "a", "amount": 1.5}), json!({"id": "b", "nested": {"k": [1, 2]}})];
        store.write(Collection::MoneyFlow, &records).await?;
        assert_eq!(store.read(Collection::MoneyFlow).await?, Some(records.clone()));

        // reopen from disk
        let reopened = JsonFileStore::new(&dir).await?;
        assert_eq!(reopened.read(Collection::MoneyFlow).await?, Some(records));
        assert!(!dir.join("moneyflow.json.tmp").exists());

        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_documents_are_reported() -> Result<(), anyhow::Error> {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir).await?;
        fs::write(store.path(Collection::CheckDeposits), "{not json").await?;
        assert!(matches!(
            store.read(Collection::CheckDeposits).await,
            Err(StorageError::Corrupt { collection: "checkdeposits", .. })
        ));
        fs::write(store.path(Collection::Users), "  \n").await?;
        assert_eq!(store.read(Collection::Users).await?, Some(Vec::new()));
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
