//! Bootstrap data written the first time a collection is found without persisted state.

use std::path::PathBuf;

use models::User;
use serde_json::{json, Value};
use tokio::fs;

use super::Collection;
use crate::errors::StorageError;

/// Where first-access data comes from: `<dir>/<collection>.json` if present, otherwise the
/// built-in demo users for `users` when enabled, otherwise nothing.
#[derive(Debug, Clone, Default)]
pub struct Seeds {
    dir: Option<PathBuf>,
    demo_users: bool,
}

impl Seeds {
    pub fn new(dir: Option<PathBuf>, demo_users: bool) -> Self {
        Self { dir, demo_users }
    }

    /// No seed data at all; every collection starts empty.
    pub fn none() -> Self {
        Self::default()
    }

    pub async fn initial(&self, collection: Collection) -> Result<Vec<Value>, StorageError> {
        if let Some(dir) = &self.dir {
            let path = dir.join(collection.file_name());
            match fs::read(&path).await {
                Ok(bytes) => {
                    return serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
                        collection: collection.name(),
                        reason: format!("seed file {}: {e}", path.display()),
                    })
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if collection == Collection::Users && self.demo_users {
            return Ok(demo_users()?
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?);
        }
        Ok(Vec::new())
    }

    pub async fn initial_users(&self) -> Result<Vec<User>, StorageError> {
        self.initial(Collection::Users)
            .await?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(StorageError::from))
            .collect()
    }
}

/// Two fictional customers with one approved deposit each.
pub fn demo_users() -> Result<Vec<User>, StorageError> {
    let users = json!([
        {
            "id": "m4k2p9q0seed0001",
            "username": "janedoe",
            "password": "DemoPass1!",
            "email": "jane.doe@example.com",
            "fullname": "Jane Doe",
            "firstName": "Jane",
            "lastName": "Doe",
            "phone": "5550100100",
            "dob": "1990-10-12",
            "address": "100 Demo Street",
            "city": "Springfield",
            "state": "IL",
            "zip": "62701",
            "country": "USA",
            "ssn": "0001",
            "accountType": "both",
            "accountNumber": "****4007",
            "routingNumber": "021000021",
            "balance": 45000.0,
            "checkingBalance": 0.0,
            "savingsBalance": 0.0,
            "transactions": [{
                "id": "m4k2pa11seedtx01",
                "type": "deposit",
                "amount": 45000.0,
                "description": "Mobile Deposit #100001",
                "date": "2025-01-02 13:21:43",
                "status": "approved"
            }],
            "marketing": true,
            "status": "active",
            "taxCode": "",
            "createdAt": "2025-01-02 13:03:12"
        },
        {
            "id": "m4k3x7w1seed0002",
            "username": "johnsmith",
            "password": "DemoPass2$",
            "email": "john.smith@example.com",
            "fullname": "John Smith",
            "firstName": "John",
            "lastName": "Smith",
            "phone": "5550100200",
            "dob": "1955-12-04",
            "address": "200 Sample Road",
            "city": "Portland",
            "state": "ME",
            "zip": "04101",
            "country": "USA",
            "ssn": "0002",
            "accountType": "checking",
            "accountNumber": "****2739",
            "routingNumber": "021000021",
            "balance": 52000.0,
            "checkingBalance": 0.0,
            "savingsBalance": 0.0,
            "transactions": [{
                "id": "m4k3xb02seedtx02",
                "type": "deposit",
                "amount": 52000.0,
                "description": "Mobile Deposit #100002",
                "date": "2025-01-02 21:03:32",
                "status": "approved"
            }],
            "marketing": true,
            "status": "active",
            "taxCode": "",
            "createdAt": "2025-01-02 21:00:03"
        }
    ]);
    Ok(serde_json::from_value(users)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_users_seed_only_the_users_collection() -> Result<(), anyhow::Error> {
        let seeds = Seeds::new(None, true);
        assert_eq!(seeds.initial(Collection::Users).await?.len(), 2);
        assert!(seeds.initial(Collection::MoneyFlow).await?.is_empty());
        assert!(Seeds::none().initial(Collection::Users).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn seed_directory_wins_over_demo_users() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("bank_seed_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join("users.json"), r#"[{"username":"seeded","email":"s@x.com"}]"#).await?;
        let seeds = Seeds::new(Some(dir.clone()), true);
        let users = seeds.initial_users().await?;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "seeded");
        assert!(seeds.initial(Collection::CheckDeposits).await?.is_empty());
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[test]
    fn demo_users_are_well_formed() {
        let users = demo_users().unwrap();
        assert_eq!(users[0].transactions.len(), 1);
        assert_ne!(users[0].username, users[1].username);
        assert_ne!(users[0].email, users[1].email);
    }
}
