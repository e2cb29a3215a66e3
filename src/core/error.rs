//! Typed error handling for the storefront catalogue
//!
//! Every item store operation surfaces failures as a single normalized
//! [`CatalogueError`], so the presentation layer can report them without
//! knowing which backend produced them.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: caller input violates a precondition. Raised before
//!   any network effect and never retried.
//! - [`CatalogueError::NotFound`]: the referenced item does not exist at
//!   mutation time.
//! - [`CatalogueError::Store`]: any document collection or blob store failure.
//!   The originating error is kept as the `source` for diagnostics.
//! - [`ConfigError`]: configuration loading and validation.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront::prelude::*;
//!
//! match store.update(&id, patch, Vec::new()).await {
//!     Ok(()) => println!("saved"),
//!     Err(CatalogueError::NotFound { id }) => println!("item {} is gone", id),
//!     Err(e) => eprintln!("{} ({})", e, e.error_code()),
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

/// The main error type for catalogue operations
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// Caller-supplied input violates a precondition
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The referenced item does not exist
    #[error("item with id '{id}' not found")]
    NotFound { id: String },

    /// The document collection or blob store failed
    #[error("failed to {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CatalogueError {
    /// Wrap a backend failure for the named operation
    pub fn store(operation: &'static str, source: anyhow::Error) -> Self {
        CatalogueError::Store { operation, source }
    }

    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogueError::Validation(e) => e.error_code(),
            CatalogueError::NotFound { .. } => "ITEM_NOT_FOUND",
            CatalogueError::Store { .. } => "STORE_ERROR",
            CatalogueError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether this error was raised before touching any backend
    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogueError::Validation(_))
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Single field validation error
    #[error("validation error for field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    #[error("validation errors: {}", join_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// An item must carry at least one image
    #[error("at least one image is required")]
    NoImages,

    /// A filter selection cannot be expressed as a single remote query
    #[error("filter selection exceeds query limits: {message}")]
    QueryLimitExceeded { message: String },

    /// Form payload was not a JSON object
    #[error("invalid form payload: {message}")]
    InvalidPayload { message: String },
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

fn join_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::FieldError { .. } | ValidationError::FieldErrors(_) => {
                "VALIDATION_ERROR"
            }
            ValidationError::NoImages => "NO_IMAGES",
            ValidationError::QueryLimitExceeded { .. } => "QUERY_LIMIT_EXCEEDED",
            ValidationError::InvalidPayload { .. } => "INVALID_PAYLOAD",
        }
    }

    /// Collapse a list of field errors, keeping a single error unwrapped
    pub fn from_fields(mut errors: Vec<FieldValidationError>) -> Self {
        if errors.len() == 1 {
            let e = errors.remove(0);
            ValidationError::FieldError {
                field: e.field,
                message: e.message,
            }
        } else {
            ValidationError::FieldErrors(errors)
        }
    }

    /// Field names involved in this error, if any
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ValidationError::FieldError { field, .. } => vec![field.as_str()],
            ValidationError::FieldErrors(errors) => {
                errors.iter().map(|e| e.field.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// One or more required values are missing
    #[error("missing required configuration values: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// Invalid value in configuration
    #[error("invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_deref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

/// A specialized Result type for catalogue operations
pub type CatalogueResult<T> = Result<T, CatalogueError>;
