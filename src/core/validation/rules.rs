//! Per-field filter and validator configuration

use crate::core::error::FieldValidationError;
use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

type Filter = Arc<dyn Fn(&str, Value) -> Result<Value> + Send + Sync>;
type Validator = Arc<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;

#[derive(Default, Clone)]
struct FieldRule {
    filters: Vec<Filter>,
    validators: Vec<Validator>,
}

/// Filters and validators for the fields of one form
///
/// Filters run first, in registration order, then every validator of the
/// field runs against the filtered value. Errors from all fields are
/// collected rather than stopping at the first one.
#[derive(Default, Clone)]
pub struct FormRules {
    fields: BTreeMap<String, FieldRule>,
    /// Only check fields present in the payload (partial updates)
    partial: bool,
}

impl FormRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for a partial payload: absent fields are skipped entirely
    pub fn partial() -> Self {
        Self {
            fields: BTreeMap::new(),
            partial: true,
        }
    }

    pub fn filter<F>(mut self, field: &str, filter: F) -> Self
    where
        F: Fn(&str, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.fields
            .entry(field.to_string())
            .or_default()
            .filters
            .push(Arc::new(filter));
        self
    }

    pub fn validate<V>(mut self, field: &str, validator: V) -> Self
    where
        V: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.fields
            .entry(field.to_string())
            .or_default()
            .validators
            .push(Arc::new(validator));
        self
    }

    /// Filter then validate a JSON object, returning the filtered object
    pub fn validate_and_filter(
        &self,
        mut payload: Map<String, Value>,
    ) -> Result<Map<String, Value>, Vec<FieldValidationError>> {
        let mut errors = Vec::new();

        for (field, rule) in &self.fields {
            if self.partial && !payload.contains_key(field) {
                continue;
            }

            let mut value = payload.remove(field).unwrap_or(Value::Null);
            for filter in &rule.filters {
                value = match filter(field.as_str(), value) {
                    Ok(v) => v,
                    Err(e) => {
                        errors.push(FieldValidationError {
                            field: field.clone(),
                            message: e.to_string(),
                        });
                        Value::Null
                    }
                };
            }

            // A partial payload may clear a field only if nothing validates it
            if !(self.partial && value.is_null() && rule.validators.is_empty()) {
                for validator in &rule.validators {
                    if let Err(message) = validator(field.as_str(), &value) {
                        errors.push(FieldValidationError {
                            field: field.clone(),
                            message,
                        });
                    }
                }
            }

            payload.insert(field.clone(), value);
        }

        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(errors)
        }
    }
}
