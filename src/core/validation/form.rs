//! Item form parsing
//!
//! Turns the raw JSON an admin form submits into typed [`ItemFields`] or
//! [`ItemPatch`] values: strings are trimmed, the price is coerced from a
//! number or numeric string, and size/type must come from their closed sets.

use super::rules::FormRules;
use super::{filters, validators};
use crate::core::error::{FieldValidationError, ValidationError};
use crate::core::item::{
    ClothingSize, ClothingType, ImageRef, ItemFields, ItemPatch, check_storable_price,
};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

const REQUIRED_TEXT: [&str; 3] = ["name", "brand", "color"];

fn size_names() -> Vec<String> {
    ClothingSize::ALL.iter().map(|s| s.as_str().to_string()).collect()
}

fn type_names() -> Vec<String> {
    ClothingType::ALL.iter().map(|t| t.as_str().to_string()).collect()
}

/// Rules for a full item form; `partial` relaxes them for updates
pub fn item_form_rules(partial: bool) -> FormRules {
    let mut rules = if partial {
        FormRules::partial()
    } else {
        FormRules::new()
    };

    for field in REQUIRED_TEXT {
        rules = rules
            .filter(field, filters::trim())
            .validate(field, validators::required())
            .validate(field, validators::not_blank())
            .validate(field, validators::string_length(1, 200));
    }

    rules
        .filter("description", filters::trim())
        .validate("description", validators::string_length(0, 2000))
        .filter("price", filters::strip_currency())
        .filter("price", filters::empty_as_null())
        .validate("price", validators::required())
        .validate("price", validators::non_negative_decimal())
        .validate("price", validators::storable_price())
        .validate("size", validators::required())
        .validate("size", validators::in_list(size_names()))
        .validate("type", validators::required())
        .validate("type", validators::in_list(type_names()))
}

/// Parse a create form into item fields
pub fn parse_item_form(payload: Value) -> Result<ItemFields, ValidationError> {
    let form = item_form_rules(false)
        .validate_and_filter(into_object(payload)?)
        .map_err(ValidationError::from_fields)?;

    Ok(ItemFields {
        name: text(&form, "name").unwrap_or_default(),
        description: text(&form, "description").unwrap_or_default(),
        brand: text(&form, "brand").unwrap_or_default(),
        price: form
            .get("price")
            .and_then(validators::decimal_from_value)
            .unwrap_or_default(),
        color: text(&form, "color").unwrap_or_default(),
        size: enumerated(&form, "size")?,
        item_type: enumerated(&form, "type")?,
    })
}

/// Parse an edit form into a partial update
///
/// Only fields present in the payload are set. An `images` array, if given,
/// is the list of existing images to keep.
pub fn parse_item_patch(payload: Value) -> Result<ItemPatch, ValidationError> {
    let mut form = item_form_rules(true)
        .validate_and_filter(into_object(payload)?)
        .map_err(ValidationError::from_fields)?;

    let images = match form.remove("images") {
        None | Some(Value::Null) => None,
        Some(value) => Some(serde_json::from_value::<Vec<ImageRef>>(value).map_err(|e| {
            ValidationError::FieldError {
                field: "images".to_string(),
                message: e.to_string(),
            }
        })?),
    };

    Ok(ItemPatch {
        name: text(&form, "name"),
        description: text(&form, "description"),
        brand: text(&form, "brand"),
        price: form.get("price").and_then(validators::decimal_from_value),
        color: text(&form, "color"),
        size: optional_enumerated(&form, "size")?,
        item_type: optional_enumerated(&form, "type")?,
        images,
    })
}

/// Check already-typed create fields
///
/// Used by the item store so callers that build [`ItemFields`] directly get
/// the same guarantees as form input.
pub fn validate_fields(fields: &ItemFields) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    for (field, value) in [
        ("name", &fields.name),
        ("brand", &fields.brand),
        ("color", &fields.color),
    ] {
        check_text(field, value, &mut errors);
    }
    check_price(fields.price, &mut errors);
    finish(errors)
}

/// Check already-typed patch fields
pub fn validate_patch(patch: &ItemPatch) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    for (field, value) in [
        ("name", &patch.name),
        ("brand", &patch.brand),
        ("color", &patch.color),
    ] {
        if let Some(value) = value {
            check_text(field, value, &mut errors);
        }
    }
    if let Some(price) = patch.price {
        check_price(price, &mut errors);
    }
    finish(errors)
}

fn check_price(price: Decimal, errors: &mut Vec<FieldValidationError>) {
    let message = if price.is_sign_negative() && !price.is_zero() {
        format!("'price' must not be negative (got {})", price)
    } else if let Err(message) = check_storable_price(price) {
        message
    } else {
        return;
    };
    errors.push(FieldValidationError {
        field: "price".to_string(),
        message,
    });
}

fn check_text(field: &str, value: &str, errors: &mut Vec<FieldValidationError>) {
    if value.trim().is_empty() {
        errors.push(FieldValidationError {
            field: field.to_string(),
            message: format!("'{}' must not be empty", field),
        });
    }
}

fn finish(errors: Vec<FieldValidationError>) -> Result<(), ValidationError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::from_fields(errors))
    }
}

fn into_object(payload: Value) -> Result<Map<String, Value>, ValidationError> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(ValidationError::InvalidPayload {
            message: format!("expected a JSON object, got {}", kind(&other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn text(form: &Map<String, Value>, field: &str) -> Option<String> {
    form.get(field).and_then(Value::as_str).map(str::to_string)
}

fn enumerated<T: std::str::FromStr<Err = String>>(
    form: &Map<String, Value>,
    field: &str,
) -> Result<T, ValidationError> {
    optional_enumerated(form, field)?.ok_or_else(|| ValidationError::FieldError {
        field: field.to_string(),
        message: format!("'{}' is required", field),
    })
}

fn optional_enumerated<T: std::str::FromStr<Err = String>>(
    form: &Map<String, Value>,
    field: &str,
) -> Result<Option<T>, ValidationError> {
    form.get(field)
        .and_then(Value::as_str)
        .map(|s| {
            s.parse::<T>().map_err(|message| ValidationError::FieldError {
                field: field.to_string(),
                message,
            })
        })
        .transpose()
}
