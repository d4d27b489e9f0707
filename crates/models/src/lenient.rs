//! Coercion of untrusted JSON into record fields.
//!
//! Request bodies and previously stored documents are never rejected for having the wrong
//! shape: monetary fields fall back to `0`, text fields render scalars as text and treat
//! `null` as empty, and a malformed transaction list becomes empty.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::user::Transaction;

/// Numbers pass through, numeric strings are parsed, everything else is `0`.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !(s.is_empty() || s == "false" || s == "0"),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Keep object entries of an array; anything that is not an array yields an empty list.
pub fn coerce_transactions(value: &Value) -> Vec<Transaction> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(coerce_number(&Value::deserialize(d)?))
}

pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(coerce_text(&Value::deserialize(d)?))
}

pub fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        other => Some(coerce_text(&other)),
    })
}

pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(coerce_flag(&Value::deserialize(d)?))
}

pub fn transactions<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Transaction>, D::Error> {
    Ok(coerce_transactions(&Value::deserialize(d)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_accept_numeric_strings_only() {
        assert_eq!(coerce_number(&json!(12.5)), 12.5);
        assert_eq!(coerce_number(&json!(" 40 ")), 40.0);
        assert_eq!(coerce_number(&json!("abc")), 0.0);
        assert_eq!(coerce_number(&json!("NaN")), 0.0);
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!(true)), 0.0);
    }

    #[test]
    fn text_renders_scalars() {
        assert_eq!(coerce_text(&json!(null)), "");
        assert_eq!(coerce_text(&json!(7)), "7");
        assert_eq!(coerce_text(&json!("x")), "x");
    }

    #[test]
    fn flags_follow_truthiness() {
        assert!(coerce_flag(&json!(true)));
        assert!(coerce_flag(&json!("yes")));
        assert!(!coerce_flag(&json!("false")));
        assert!(!coerce_flag(&json!(0)));
        assert!(!coerce_flag(&json!(null)));
    }

    #[test]
    fn malformed_transaction_lists_are_dropped() {
        assert!(coerce_transactions(&json!("nope")).is_empty());
        let list = coerce_transactions(&json!([{"id": "t1", "amount": 5}, 3, "x"]));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "t1");
    }
}
