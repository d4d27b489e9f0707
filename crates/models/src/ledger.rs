//! Administrator-curated ledger entries: money flows and check deposits.
//!
//! Both are created from free-form bodies. Named fields map to relational columns; anything
//! else lands in `extra` and travels as one opaque payload. After creation only `status`
//! changes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;
use crate::lenient;

pub const DEFAULT_LEDGER_STATUS: &str = "pending";

fn default_status() -> String {
    DEFAULT_LEDGER_STATUS.to_string()
}

/// Common surface of entries addressed by id whose status is the only mutable field.
pub trait LedgerEntry: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn set_status(&mut self, status: &Value);
}

/// Status text for a create or update body; absent, null or empty means `pending`.
pub fn status_from(value: Option<&Value>) -> String {
    match value.map(lenient::coerce_text) {
        Some(s) if !s.is_empty() => s,
        _ => default_status(),
    }
}

fn from_body<T: LedgerEntry>(body: &Map<String, Value>) -> Result<T, ModelError> {
    let mut fields = body.clone();
    fields.remove("id");
    fields.remove("createdAt");
    Ok(serde_json::from_value(Value::Object(fields))?)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyFlow {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(default = "default_status", deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MoneyFlow {
    pub fn create(body: &Map<String, Value>, id: String, created_at: String) -> Result<Self, ModelError> {
        let mut flow: MoneyFlow = from_body(body)?;
        flow.id = id;
        flow.created_at = created_at;
        flow.status = status_from(body.get("status"));
        Ok(flow)
    }
}

impl LedgerEntry for MoneyFlow {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_status(&mut self, status: &Value) {
        self.status = status_from(Some(status));
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDeposit {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub check_number: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: String,
    /// Opaque image reference, usually a data URI or URL.
    #[serde(default, deserialize_with = "lenient::text")]
    pub image: String,
    #[serde(default = "default_status", deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CheckDeposit {
    pub fn create(body: &Map<String, Value>, id: String, created_at: String) -> Result<Self, ModelError> {
        let mut check: CheckDeposit = from_body(body)?;
        check.id = id;
        check.created_at = created_at;
        check.status = status_from(body.get("status"));
        Ok(check)
    }
}

impl LedgerEntry for CheckDeposit {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_status(&mut self, status: &Value) {
        self.status = status_from(Some(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flow_defaults_to_pending_and_keeps_extra_fields() {
        let body = json!({"type": "wire", "amount": "125", "username": "alice", "memo": "rent", "id": "spoof"});
        let flow = MoneyFlow::create(body.as_object().unwrap(), "f1".into(), "2025-01-01 10:00:00".into()).unwrap();
        assert_eq!(flow.id, "f1");
        assert_eq!(flow.kind, "wire");
        assert_eq!(flow.amount, 125.0);
        assert_eq!(flow.status, "pending");
        assert_eq!(flow.extra.get("memo"), Some(&json!("rent")));
        let wire = serde_json::to_value(&flow).unwrap();
        assert_eq!(wire["type"], "wire");
        assert_eq!(wire["createdAt"], "2025-01-01 10:00:00");
    }

    #[test]
    fn check_status_updates_fall_back_to_pending() {
        let body = json!({"checkNumber": "1001", "image": "data:image/png;base64,AAA", "status": "approved"});
        let mut check = CheckDeposit::create(body.as_object().unwrap(), "c1".into(), String::new()).unwrap();
        assert_eq!(check.status, "approved");
        assert_eq!(check.check_number, "1001");
        check.set_status(&json!("rejected"));
        assert_eq!(check.status, "rejected");
        check.set_status(&Value::Null);
        assert_eq!(check.status, "pending");
    }

    #[test]
    fn stored_documents_round_trip() {
        let body = json!({"type": "ach", "amount": 10, "note": {"nested": true}});
        let flow = MoneyFlow::create(body.as_object().unwrap(), "f2".into(), "t".into()).unwrap();
        let back: MoneyFlow = serde_json::from_value(serde_json::to_value(&flow).unwrap()).unwrap();
        assert_eq!(back, flow);
    }
}
