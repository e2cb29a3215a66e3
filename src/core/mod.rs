//! Core module containing the catalogue model, its services and the item store

pub mod auth;
pub mod error;
pub mod filter;
pub mod item;
pub mod query;
pub mod service;
pub mod store;
pub mod validation;

pub use auth::{AccessPolicy, AdminGate, Session};
pub use error::{CatalogueError, CatalogueResult, ConfigError, ValidationError};
pub use filter::FilterSelection;
pub use item::{ClothingSize, ClothingType, ImageRef, ImageUpload, Item, ItemFields, ItemPatch};
pub use query::{Constraint, DocumentQuery, QueryLimits};
pub use service::{BlobStore, Document, DocumentCollection};
pub use store::{FilterStrategy, ItemStore};
