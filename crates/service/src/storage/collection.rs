use async_trait::async_trait;
use configs::Backend;
use models::{CheckDeposit, LedgerEntry, MoneyFlow, User};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{Collection, Seeds, SetupReport, Storage, UserPatch};
use crate::errors::{StorageError, UniqueField};

/// Raw whole-collection persistence: a document per collection name.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    fn backend(&self) -> Backend;
    /// `None` when nothing has ever been persisted for the collection.
    async fn read(&self, collection: Collection) -> Result<Option<Vec<Value>>, StorageError>;
    /// Replace the whole collection.
    async fn write(&self, collection: Collection, records: &[Value]) -> Result<(), StorageError>;
    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// [`Storage`] over any [`CollectionStore`]: each operation loads the collection, edits it in
/// memory and writes it back while holding that collection's mutex.
pub struct CollectionStorage<S> {
    store: S,
    seeds: Seeds,
    users: Mutex<()>,
    flows: Mutex<()>,
    checks: Mutex<()>,
}

impl<S: CollectionStore> CollectionStorage<S> {
    pub fn new(store: S, seeds: Seeds) -> Self {
        Self { store, seeds, users: Mutex::new(()), flows: Mutex::new(()), checks: Mutex::new(()) }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock_for(&self, collection: Collection) -> &Mutex<()> {
        match collection {
            Collection::Users => &self.users,
            Collection::MoneyFlow => &self.flows,
            Collection::CheckDeposits => &self.checks,
        }
    }

    /// Current records of `collection`, seeding it on first access. Callers hold the lock.
    pub async fn load(&self, collection: Collection) -> Result<Vec<Value>, StorageError> {
        if let Some(records) = self.store.read(collection).await? {
            return Ok(records);
        }
        let seeded = self.seeds.initial(collection).await?;
        self.store.write(collection, &seeded).await?;
        info!(collection = collection.name(), count = seeded.len(), "collection initialised");
        Ok(seeded)
    }

    /// Replace `collection` with `records`. Callers hold the lock.
    pub async fn save(&self, collection: Collection, records: &[Value]) -> Result<(), StorageError> {
        self.store.write(collection, records).await
    }

    async fn load_typed<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StorageError> {
        self.load(collection)
            .await?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(StorageError::from))
            .collect()
    }

    async fn save_typed<T: Serialize>(&self, collection: Collection, items: &[T]) -> Result<(), StorageError> {
        let records = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.save(collection, &records).await
    }

    async fn read_all<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StorageError> {
        let _guard = self.lock_for(collection).lock().await;
        self.load_typed(collection).await
    }

    /// Apply a mutation to the collection and persist it when `f` reports a change.
    async fn modify<T, R, F>(&self, collection: Collection, f: F) -> Result<R, StorageError>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce(&mut Vec<T>) -> Result<(R, bool), StorageError>,
    {
        let _guard = self.lock_for(collection).lock().await;
        let mut items = self.load_typed::<T>(collection).await?;
        let (out, changed) = f(&mut items)?;
        if changed {
            self.save_typed(collection, &items).await?;
            debug!(collection = collection.name(), count = items.len(), "collection saved");
        }
        Ok(out)
    }

    async fn insert_entry<T: LedgerEntry>(&self, collection: Collection, entry: T) -> Result<T, StorageError> {
        self.modify(collection, |items: &mut Vec<T>| {
            items.push(entry.clone());
            Ok((entry, true))
        })
        .await
    }

    async fn update_entry_status<T: LedgerEntry>(
        &self,
        collection: Collection,
        id: &str,
        status: Value,
    ) -> Result<Option<T>, StorageError> {
        self.modify(collection, |items: &mut Vec<T>| {
            match items.iter_mut().find(|e| e.id() == id) {
                Some(entry) => {
                    entry.set_status(&status);
                    Ok((Some(entry.clone()), true))
                }
                None => Ok((None, false)),
            }
        })
        .await
    }

    async fn delete_entry<T: LedgerEntry>(&self, collection: Collection, id: &str) -> Result<bool, StorageError> {
        self.modify(collection, |items: &mut Vec<T>| {
            let before = items.len();
            items.retain(|e| e.id() != id);
            let removed = items.len() != before;
            Ok((removed, removed))
        })
        .await
    }
}

#[async_trait]
impl<S: CollectionStore> Storage for CollectionStorage<S> {
    fn backend(&self) -> Backend {
        self.store.backend()
    }

    async fn setup(&self) -> Result<SetupReport, StorageError> {
        let mut seeded_users = 0;
        for collection in Collection::ALL {
            let _guard = self.lock_for(collection).lock().await;
            if self.store.read(collection).await?.is_none() {
                let records = self.load(collection).await?;
                if collection == Collection::Users {
                    seeded_users = records.len();
                }
            }
        }
        Ok(SetupReport { backend: self.backend(), seeded_users })
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.read_all(Collection::Users).await
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StorageError> {
        let users: Vec<User> = self.read_all(Collection::Users).await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    async fn find_login(&self, identifier: &str, password: &str) -> Result<Option<User>, StorageError> {
        let users: Vec<User> = self.read_all(Collection::Users).await?;
        Ok(users.into_iter().find(|u| u.matches_login(identifier, password)))
    }

    async fn insert_user(&self, user: User) -> Result<User, StorageError> {
        self.modify(Collection::Users, |users: &mut Vec<User>| {
            if users.iter().any(|u| u.username == user.username) {
                return Err(StorageError::Conflict(UniqueField::Username));
            }
            if users.iter().any(|u| u.email == user.email) {
                return Err(StorageError::Conflict(UniqueField::Email));
            }
            users.push(user.clone());
            Ok((user, true))
        })
        .await
    }

    async fn update_user(&self, username: &str, patch: UserPatch) -> Result<Option<User>, StorageError> {
        self.modify(Collection::Users, |users: &mut Vec<User>| {
            match users.iter_mut().find(|u| u.username == username) {
                Some(user) => {
                    patch(user)?;
                    Ok((Some(user.clone()), true))
                }
                None => Ok((None, false)),
            }
        })
        .await
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StorageError> {
        self.modify(Collection::Users, |users: &mut Vec<User>| {
            match users.iter().position(|u| u.username == username) {
                Some(idx) => {
                    users.remove(idx);
                    Ok((true, true))
                }
                None => Ok((false, false)),
            }
        })
        .await
    }

    async fn list_flows(&self) -> Result<Vec<MoneyFlow>, StorageError> {
        self.read_all(Collection::MoneyFlow).await
    }

    async fn insert_flow(&self, flow: MoneyFlow) -> Result<MoneyFlow, StorageError> {
        self.insert_entry(Collection::MoneyFlow, flow).await
    }

    async fn update_flow_status(&self, id: &str, status: Value) -> Result<Option<MoneyFlow>, StorageError> {
        self.update_entry_status(Collection::MoneyFlow, id, status).await
    }

    async fn delete_flow(&self, id: &str) -> Result<bool, StorageError> {
        self.delete_entry::<MoneyFlow>(Collection::MoneyFlow, id).await
    }

    async fn list_checks(&self) -> Result<Vec<CheckDeposit>, StorageError> {
        self.read_all(Collection::CheckDeposits).await
    }

    async fn insert_check(&self, check: CheckDeposit) -> Result<CheckDeposit, StorageError> {
        self.insert_entry(Collection::CheckDeposits, check).await
    }

    async fn update_check_status(&self, id: &str, status: Value) -> Result<Option<CheckDeposit>, StorageError> {
        self.update_entry_status(Collection::CheckDeposits, id, status).await
    }

    async fn delete_check(&self, id: &str) -> Result<bool, StorageError> {
        self.delete_entry::<CheckDeposit>(Collection::CheckDeposits, id).await
    }

    async fn shutdown(&self) -> Result<(), StorageError> {
        self.store.close().await
    }
}
