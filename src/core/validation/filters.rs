//! Reusable field filters
//!
//! These filters normalize raw form values before validation

use anyhow::Result;
use serde_json::Value;

/// Filter: trim surrounding whitespace from a string
pub fn trim() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) if s.trim().len() != s.len() => Ok(Value::String(s.trim().to_string())),
        other => Ok(other),
    }
}

/// Filter: treat an empty string as an absent value
///
/// HTML forms submit untouched inputs as `""`.
pub fn empty_as_null() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value.as_str() {
        Some("") => Ok(Value::Null),
        _ => Ok(value),
    }
}

/// Filter: drop a leading `$` and thousands separators from a price string
pub fn strip_currency() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => {
            let digits = s.trim().trim_start_matches('$').replace(',', "");
            Ok(Value::String(digits.trim().to_string()))
        }
        other => Ok(other),
    }
}
