//! Reusable field validators
//!
//! Each validator receives the field name and its (already filtered) value
//! and returns a human-readable message on failure.

use crate::core::item::check_storable_price;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Validator: field is required (present, not null)
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_null() {
            Err(format!("'{}' is required", field))
        } else {
            Ok(())
        }
    }
}

/// Validator: string must not be blank
pub fn not_blank() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_str() {
        Some(s) if s.trim().is_empty() => Err(format!("'{}' must not be empty", field)),
        _ => Ok(()),
    }
}

/// Validator: string length must be within range
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if len < min {
                Err(format!(
                    "'{}' must have at least {} characters (got {})",
                    field, min, len
                ))
            } else if len > max {
                Err(format!(
                    "'{}' must not exceed {} characters (got {})",
                    field, max, len
                ))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        }
    }
}

/// Validator: value must be a decimal number that is not negative
///
/// Accepts JSON numbers and numeric strings.
pub fn non_negative_decimal() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone
{
    |field: &str, value: &Value| {
        if value.is_null() {
            return Ok(());
        }
        match decimal_from_value(value) {
            Some(d) if d.is_sign_negative() && !d.is_zero() => Err(format!(
                "'{}' must not be negative (got {})",
                field, d
            )),
            Some(_) => Ok(()),
            None => Err(format!("'{}' must be a number (got {})", field, value)),
        }
    }
}

/// Validator: a non-negative price must be storable without rounding
pub fn storable_price() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |_: &str, value: &Value| match decimal_from_value(value) {
        Some(d) if !d.is_sign_negative() => check_storable_price(d),
        _ => Ok(()),
    }
}

/// Validator: string value must be in allowed list
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            if !allowed.iter().any(|a| a == s) {
                Err(format!(
                    "'{}' must be one of: {} (got '{}')",
                    field,
                    allowed.join(", "),
                    s
                ))
            } else {
                Ok(())
            }
        } else if value.is_null() {
            Ok(())
        } else {
            Err(format!("'{}' must be a string", field))
        }
    }
}

/// Read a decimal from a JSON number or numeric string
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
