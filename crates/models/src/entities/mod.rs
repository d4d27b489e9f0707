//! SeaORM entities for the relational backend, one table per collection.

pub mod users;
pub mod moneyflow;
pub mod checkdeposits;

use serde_json::{Map, Value};

/// Unmapped fields are stored as one JSON object; anything else reads back as empty.
pub(crate) fn extension_map(data: Value) -> Map<String, Value> {
    match data {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
