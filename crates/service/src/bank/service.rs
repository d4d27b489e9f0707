use std::sync::Arc;

use common::ids::{now_timestamp, uniqid};
use configs::AdminConfig;
use models::lenient::{coerce_number, coerce_text};
use models::{CheckDeposit, MoneyFlow, Transaction, User};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::errors::BankError;
use crate::storage::{Storage, StorageError, UserPatch};

pub type Body = Map<String, Value>;

/// Business logic behind every endpoint. Each operation returns the envelope `data` payload.
#[derive(Clone)]
pub struct BankService {
    storage: Arc<dyn Storage>,
    admin: AdminConfig,
}

fn text_field(body: &Body, key: &str) -> Option<String> {
    body.get(key).filter(|v| !v.is_null()).map(coerce_text)
}

fn public(user: &User) -> Result<Value, BankError> {
    Ok(user.to_public()?)
}

impl BankService {
    pub fn new(storage: Arc<dyn Storage>, admin: AdminConfig) -> Self {
        Self { storage, admin }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Match on username or email plus password.
    pub async fn login(&self, body: &Body) -> Result<Value, BankError> {
        let (Some(identifier), Some(password)) = (text_field(body, "username"), text_field(body, "password")) else {
            return Err(BankError::InvalidCredentials);
        };
        match self.storage.find_login(&identifier, &password).await? {
            Some(user) => {
                info!(username = %user.username, "user logged in");
                Ok(json!({ "user": public(&user)? }))
            }
            None => {
                warn!(identifier = %identifier, "login rejected");
                Err(BankError::InvalidCredentials)
            }
        }
    }

    pub async fn register(&self, body: &Body) -> Result<Value, BankError> {
        let user = User::register(body, uniqid(), now_timestamp())?;
        let user = self.storage.insert_user(user).await?;
        info!(username = %user.username, "user registered");
        Ok(json!({ "user": public(&user)? }))
    }

    pub async fn get_user(&self, username: &str) -> Result<Value, BankError> {
        let user = self.storage.find_user(username).await?.ok_or_else(BankError::user_not_found)?;
        Ok(json!({ "user": public(&user)? }))
    }

    /// Shallow merge: every body key overwrites the stored value, including `password` and `transactions`.
    pub async fn update_user(&self, username: &str, body: &Body) -> Result<Value, BankError> {
        let body = body.clone();
        let patch: UserPatch = Box::new(move |user: &mut User| -> Result<(), StorageError> {
            user.merge(&body)?;
            Ok(())
        });
        let user = self
            .storage
            .update_user(username, patch)
            .await?
            .ok_or_else(BankError::user_not_found)?;
        Ok(json!({ "user": public(&user)? }))
    }

    pub async fn delete_user(&self, username: &str) -> Result<Value, BankError> {
        if !self.storage.delete_user(username).await? {
            return Err(BankError::user_not_found());
        }
        info!(username, "user deleted");
        Ok(json!({ "message": "User deleted" }))
    }

    pub async fn list_users(&self) -> Result<Value, BankError> {
        let users = self
            .storage
            .list_users()
            .await?
            .iter()
            .map(public)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({ "users": users }))
    }

    /// Fixed credential pair from configuration; not a security boundary.
    pub fn admin_login(&self, body: &Body) -> Result<Value, BankError> {
        let username = text_field(body, "username");
        let password = text_field(body, "password");
        if username.as_deref() == Some(self.admin.username.as_str())
            && password.as_deref() == Some(self.admin.password.as_str())
        {
            Ok(json!({ "admin": { "username": self.admin.username } }))
        } else {
            Err(BankError::InvalidAdminCredentials)
        }
    }

    pub async fn add_transaction(&self, username: &str, body: &Body) -> Result<Value, BankError> {
        let transaction = Transaction::record(body.clone(), uniqid(), now_timestamp());
        let appended = transaction.clone();
        let patch: UserPatch = Box::new(move |user: &mut User| -> Result<(), StorageError> {
            user.transactions.push(appended);
            Ok(())
        });
        self.storage
            .update_user(username, patch)
            .await?
            .ok_or_else(BankError::user_not_found)?;
        Ok(json!({ "transaction": transaction }))
    }

    pub async fn transactions(&self, username: &str) -> Result<Value, BankError> {
        let user = self.storage.find_user(username).await?.ok_or_else(BankError::user_not_found)?;
        Ok(json!({ "transactions": user.transactions }))
    }

    /// `balance` is always written; checking and savings only when present and non-null.
    pub async fn update_balance(&self, username: &str, body: &Body) -> Result<Value, BankError> {
        let balance = coerce_number(body.get("balance").unwrap_or(&Value::Null));
        let checking = body.get("checkingBalance").filter(|v| !v.is_null()).map(coerce_number);
        let savings = body.get("savingsBalance").filter(|v| !v.is_null()).map(coerce_number);
        let patch: UserPatch = Box::new(move |user: &mut User| -> Result<(), StorageError> {
            user.balance = balance;
            if let Some(v) = checking {
                user.checking_balance = v;
            }
            if let Some(v) = savings {
                user.savings_balance = v;
            }
            Ok(())
        });
        let user = self
            .storage
            .update_user(username, patch)
            .await?
            .ok_or_else(BankError::user_not_found)?;
        Ok(json!({ "balance": user.balance }))
    }

    pub async fn list_flows(&self) -> Result<Value, BankError> {
        Ok(json!({ "flows": self.storage.list_flows().await? }))
    }

    pub async fn create_flow(&self, body: &Body) -> Result<Value, BankError> {
        let flow = MoneyFlow::create(body, uniqid(), now_timestamp())?;
        let flow = self.storage.insert_flow(flow).await?;
        Ok(json!({ "flow": flow }))
    }

    pub async fn update_flow(&self, id: &str, body: &Body) -> Result<Value, BankError> {
        let status = body.get("status").cloned().unwrap_or(Value::Null);
        let flow = self
            .storage
            .update_flow_status(id, status)
            .await?
            .ok_or(BankError::NotFound("Flow"))?;
        Ok(json!({ "flow": flow }))
    }

    pub async fn delete_flow(&self, id: &str) -> Result<Value, BankError> {
        if !self.storage.delete_flow(id).await? {
            return Err(BankError::NotFound("Flow"));
        }
        Ok(json!({ "message": "Flow deleted" }))
    }

    pub async fn list_checks(&self) -> Result<Value, BankError> {
        Ok(json!({ "checks": self.storage.list_checks().await? }))
    }

    pub async fn create_check(&self, body: &Body) -> Result<Value, BankError> {
        let check = CheckDeposit::create(body, uniqid(), now_timestamp())?;
        let check = self.storage.insert_check(check).await?;
        Ok(json!({ "check": check }))
    }

    pub async fn update_check(&self, id: &str, body: &Body) -> Result<Value, BankError> {
        let status = body.get("status").cloned().unwrap_or(Value::Null);
        let check = self
            .storage
            .update_check_status(id, status)
            .await?
            .ok_or(BankError::NotFound("Check"))?;
        Ok(json!({ "check": check }))
    }

    pub async fn delete_check(&self, id: &str) -> Result<Value, BankError> {
        if !self.storage.delete_check(id).await? {
            return Err(BankError::NotFound("Check"));
        }
        Ok(json!({ "message": "Check deleted" }))
    }

    pub async fn setup(&self) -> Result<Value, BankError> {
        let report = self.storage.setup().await?;
        let detail = if report.seeded_users == 0 {
            "existing data kept, no seed needed".to_string()
        } else {
            format!("{} seed users loaded", report.seeded_users)
        };
        Ok(json!({ "message": format!("Setup complete ({} backend): {detail}.", report.backend.as_str()) }))
    }
}
