//! # Storefront
//!
//! Data-access core for a small catalogue storefront: a public, filterable
//! listing of clothing items and an admin-gated inventory manager, backed by
//! a document collection and a blob store.
//!
//! ## Features
//!
//! - **Item Store**: list, get, create, update and delete items together
//!   with their image collections
//! - **Filtering**: evaluate selections locally, or translate them into
//!   queries run by the document engine within its limits
//! - **Image Lifecycle**: uploads are cleaned up when an operation fails;
//!   replaced and deleted images are removed from the blob store
//! - **Legacy Records**: older single-URL and URL-list image shapes read as
//!   the current shape
//! - **Admin Gate**: shared-secret check yielding an explicit [`Session`](core::Session)
//! - **Pluggable Backends**: in-memory, filesystem and MongoDB
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use storefront::prelude::*;
//!
//! let store = ItemStore::new(
//!     Arc::new(InMemoryDocumentCollection::new()),
//!     Arc::new(InMemoryBlobStore::new()),
//! );
//!
//! let fields = parse_item_form(json!({
//!     "name": "Test Shirt",
//!     "brand": "Acme",
//!     "price": "19.99",
//!     "color": "Blue",
//!     "size": "M",
//!     "type": "Shirt",
//! }))?;
//! let id = store.create(fields, vec![ImageUpload::new("front.jpg", bytes)]).await?;
//!
//! let medium = store
//!     .list(Some(&FilterSelection::new().sizes([ClothingSize::Medium])))
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod seed;
pub mod storage;
pub mod telemetry;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AccessPolicy, AdminGate, Session},
        error::{CatalogueError, CatalogueResult, ConfigError, ValidationError},
        filter::FilterSelection,
        item::{ClothingSize, ClothingType, ImageRef, ImageUpload, Item, ItemFields, ItemPatch},
        query::{DocumentQuery, QueryLimits},
        service::{BlobStore, Document, DocumentCollection},
        store::{FilterStrategy, ItemStore},
        validation::{parse_item_form, parse_item_patch},
    };

    // === Storage ===
    pub use crate::storage::{
        FsBlobStore, InMemoryBlobStore, InMemoryDocumentCollection, open_item_store,
    };
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoDocumentCollection;

    // === Config ===
    pub use crate::config::StorefrontConfig;

    // === Seed ===
    pub use crate::seed::{sample_items, seed_catalogue};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::json;
    pub use std::sync::Arc;
}
