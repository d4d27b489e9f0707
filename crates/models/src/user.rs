//! Bank customer records and their embedded transaction history.
//!
//! Wire names are camelCase. Fields the schema does not name are kept in `extra` so that
//! file and KV backends round-trip whatever a shallow merge wrote.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;
use crate::lenient;

pub const DEFAULT_USER_STATUS: &str = "active";

fn default_status() -> String {
    DEFAULT_USER_STATUS.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub fullname: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub dob: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub zip: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub country: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub ssn: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub account_type: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub account_number: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub routing_number: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub balance: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub checking_balance: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub savings_balance: f64,
    #[serde(default, deserialize_with = "lenient::transactions")]
    pub transactions: Vec<Transaction>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub marketing: bool,
    #[serde(default = "default_status", deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub tax_code: String,
    #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a user's transaction list: caller fields plus generated `id` and `date`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Transaction {
    /// Build from caller fields; the generated id and date always win over caller values.
    pub fn record(mut details: Map<String, Value>, id: String, date: String) -> Self {
        details.remove("id");
        details.remove("date");
        Self { id, date, details }
    }
}

impl User {
    /// Build a new account from a registration body.
    ///
    /// Only named profile/account fields are taken from the body; the transaction list starts
    /// empty, balances default to 0 and status to `active`.
    pub fn register(body: &Map<String, Value>, id: String, created_at: String) -> Result<Self, ModelError> {
        let mut user: User = serde_json::from_value(Value::Object(body.clone()))?;
        user.id = id;
        user.created_at = created_at;
        user.transactions.clear();
        user.status_reason = None;
        user.extra.clear();
        if user.status.is_empty() {
            user.status = default_status();
        }
        Ok(user)
    }

    /// Shallow merge: every key in `body` replaces the stored value, every other key is kept.
    /// Nothing is protected, so `password`, `id` or `transactions` in the body overwrite too.
    pub fn merge(&mut self, body: &Map<String, Value>) -> Result<(), ModelError> {
        let mut current = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => return Err(ModelError::Validation("user did not serialize to an object".into())),
        };
        for (key, value) in body {
            current.insert(key.clone(), value.clone());
        }
        *self = serde_json::from_value(Value::Object(current))?;
        Ok(())
    }

    /// Outbound representation; the password never leaves the process.
    pub fn to_public(&self) -> Result<Value, ModelError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("password");
        }
        Ok(value)
    }

    pub fn matches_login(&self, identifier: &str, password: &str) -> bool {
        (self.username == identifier || self.email == identifier) && self.password == password
    }
}
