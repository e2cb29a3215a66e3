//! Document queries and translation of filter selections into them
//!
//! A [`DocumentQuery`] is what the server-side strategy hands to a
//! [`DocumentCollection`](crate::core::service::DocumentCollection): a list of
//! ANDed constraints plus an ordering. Managed document engines restrict how
//! many constraints a single query may combine, so translation checks the
//! collection's [`QueryLimits`] and refuses selections that exceed them.
//!
//! # Example
//! ```rust,ignore
//! let selection = FilterSelection::new()
//!     .min_price(Decimal::new(50, 0))
//!     .sizes([ClothingSize::Medium]);
//! let query = DocumentQuery::from_selection(&selection, &collection.query_limits())?;
//! // price >= 50 AND size IN ["M"] ORDER BY createdAt DESC
//! ```

use crate::core::error::ValidationError;
use crate::core::filter::{FilterSelection, active};
use crate::core::item::price_value;
use crate::core::service::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Field holding the creation timestamp in stored documents
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering requested from the query engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn newest_first() -> Self {
        Self {
            field: CREATED_AT_FIELD.to_string(),
            direction: Direction::Desc,
        }
    }
}

/// A single constraint on a document field
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive numeric range; an absent bound is open
    Range {
        field: String,
        min: Option<Value>,
        max: Option<Value>,
    },

    /// Field value equals one of `values`
    In { field: String, values: Vec<Value> },
}

impl Constraint {
    pub fn field(&self) -> &str {
        match self {
            Constraint::Range { field, .. } | Constraint::In { field, .. } => field,
        }
    }

    /// Evaluate the constraint against a document
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(value) = doc.get(self.field()) else {
            return false;
        };
        match self {
            Constraint::Range { min, max, .. } => {
                min.as_ref()
                    .is_none_or(|min| compare_values(value, min) != Ordering::Less)
                    && max
                        .as_ref()
                        .is_none_or(|max| compare_values(value, max) != Ordering::Greater)
            }
            Constraint::In { values, .. } => values.iter().any(|v| v == value),
        }
    }
}

/// Limits a query engine places on a single query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    /// Distinct fields that may carry a range constraint
    pub max_range_fields: usize,

    /// Membership (`in`) constraints per query
    pub max_membership_filters: usize,

    /// Values in one membership list
    pub max_membership_values: usize,
}

impl Default for QueryLimits {
    /// Conservative limits of managed document stores: one inequality field,
    /// one `in` clause, ten values per clause
    fn default() -> Self {
        Self {
            max_range_fields: 1,
            max_membership_filters: 1,
            max_membership_values: 10,
        }
    }
}

impl QueryLimits {
    /// No limits, for engines that combine arbitrary constraints
    pub fn unlimited() -> Self {
        Self {
            max_range_fields: usize::MAX,
            max_membership_filters: usize::MAX,
            max_membership_values: usize::MAX,
        }
    }
}

/// Constraints plus ordering, ready for a document collection
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub constraints: Vec<Constraint>,
    pub order: Option<SortOrder>,
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self::all_newest_first()
    }
}

impl DocumentQuery {
    /// Every document, newest first
    pub fn all_newest_first() -> Self {
        Self {
            constraints: Vec::new(),
            order: Some(SortOrder::newest_first()),
        }
    }

    /// Translate a filter selection, failing fast if it exceeds `limits`
    pub fn from_selection(
        selection: &FilterSelection,
        limits: &QueryLimits,
    ) -> Result<Self, ValidationError> {
        let mut constraints = Vec::new();

        if selection.min_price.is_some() || selection.max_price.is_some() {
            let bound = |price| {
                price_value(price).map_err(|e| ValidationError::FieldError {
                    field: "price".to_string(),
                    message: e.to_string(),
                })
            };
            constraints.push(Constraint::Range {
                field: "price".to_string(),
                min: selection.min_price.map(bound).transpose()?,
                max: selection.max_price.map(bound).transpose()?,
            });
        }

        if let Some(sizes) = active(&selection.sizes) {
            constraints.push(membership("size", sizes.iter().map(|s| s.as_str())));
        }
        if let Some(types) = active(&selection.types) {
            constraints.push(membership("type", types.iter().map(|t| t.as_str())));
        }
        if let Some(brands) = active(&selection.brands) {
            constraints.push(membership("brand", brands.iter().map(String::as_str)));
        }
        if let Some(colors) = active(&selection.colors) {
            constraints.push(membership("color", colors.iter().map(String::as_str)));
        }

        let query = Self {
            constraints,
            order: Some(SortOrder::newest_first()),
        };
        query.check_limits(limits)?;
        Ok(query)
    }

    /// Verify the query fits the engine's limits
    pub fn check_limits(&self, limits: &QueryLimits) -> Result<(), ValidationError> {
        let mut range_fields: Vec<&str> = self
            .constraints
            .iter()
            .filter(|c| matches!(c, Constraint::Range { .. }))
            .map(Constraint::field)
            .collect();
        range_fields.sort_unstable();
        range_fields.dedup();
        if range_fields.len() > limits.max_range_fields {
            return Err(ValidationError::QueryLimitExceeded {
                message: format!(
                    "{} range fields ({}) but at most {} allowed",
                    range_fields.len(),
                    range_fields.join(", "),
                    limits.max_range_fields
                ),
            });
        }

        let memberships: Vec<(&str, usize)> = self
            .constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::In { field, values } => Some((field.as_str(), values.len())),
                _ => None,
            })
            .collect();
        if memberships.len() > limits.max_membership_filters {
            let fields: Vec<&str> = memberships.iter().map(|(f, _)| *f).collect();
            return Err(ValidationError::QueryLimitExceeded {
                message: format!(
                    "{} membership filters ({}) but at most {} allowed; narrow the selection or use in-memory filtering",
                    memberships.len(),
                    fields.join(", "),
                    limits.max_membership_filters
                ),
            });
        }
        if let Some((field, count)) = memberships
            .iter()
            .find(|(_, count)| *count > limits.max_membership_values)
        {
            return Err(ValidationError::QueryLimitExceeded {
                message: format!(
                    "'{}' lists {} values but at most {} allowed",
                    field, count, limits.max_membership_values
                ),
            });
        }

        Ok(())
    }

    /// Evaluate every constraint against a document
    pub fn matches(&self, doc: &Document) -> bool {
        self.constraints.iter().all(|c| c.matches(doc))
    }
}

fn membership<'a>(field: &str, values: impl Iterator<Item = &'a str>) -> Constraint {
    Constraint::In {
        field: field.to_string(),
        values: values.map(|v| Value::String(v.to_string())).collect(),
    }
}

/// Total order over stored JSON values
///
/// Numbers compare numerically; strings that are both RFC 3339 timestamps
/// compare as instants, other strings lexically. Mixed or structured values
/// sort by kind.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (
                x.parse::<DateTime<Utc>>(),
                y.parse::<DateTime<Utc>>(),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
