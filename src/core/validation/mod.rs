//! Validation and filtering system
//!
//! Form payloads pass through per-field filters (trimming, blank handling)
//! and validators before they become typed item values.

pub mod filters;
pub mod form;
pub mod rules;
pub mod validators;

pub use form::{parse_item_form, parse_item_patch, validate_fields, validate_patch};
pub use rules::FormRules;
