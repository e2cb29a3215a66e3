//! Shared test harness for storage backend testing
//!
//! Provides item fixtures, raw document builders, and wrappers that inject
//! failures into or count calls made against a backend.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod item_store_tests;

use anyhow::{Result, bail};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use storefront::core::item::{ClothingSize, ClothingType, ImageUpload, ItemFields};
use storefront::core::query::{DocumentQuery, QueryLimits};
use storefront::core::service::{BlobStore, Document, DocumentCollection};
use storefront::storage::InMemoryBlobStore;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Valid create fields with sensible defaults
pub fn test_fields(name: &str) -> ItemFields {
    ItemFields {
        name: name.to_string(),
        description: format!("{} for testing", name),
        brand: "Test Brand".to_string(),
        price: Decimal::new(1999, 2),
        color: "Blue".to_string(),
        size: ClothingSize::Medium,
        item_type: ClothingType::Shirt,
    }
}

/// Fields with an explicit price (in cents), size, type, brand and color
pub fn fields_with(
    name: &str,
    cents: i64,
    size: ClothingSize,
    item_type: ClothingType,
    brand: &str,
    color: &str,
) -> ItemFields {
    ItemFields {
        price: Decimal::new(cents, 2),
        size,
        item_type,
        brand: brand.to_string(),
        color: color.to_string(),
        ..test_fields(name)
    }
}

/// A small JPEG-looking upload
pub fn jpeg(file_name: &str) -> ImageUpload {
    ImageUpload::new(file_name, vec![0xFF, 0xD8, 0xFF, 0xE0]).with_content_type("image/jpeg")
}

/// Unwrap a `json!` object into a document
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected a JSON object, got {}", other),
    }
}

/// A record in the oldest stored shape, with a single `imageUrl`
pub fn legacy_single_image_doc(name: &str, created_at: &str, image_url: &str) -> Document {
    doc(serde_json::json!({
        "name": name,
        "description": "Stored before multi-image support",
        "brand": "Royal Luxe",
        "price": 299.99,
        "color": "Navy",
        "size": "M",
        "type": "Jacket",
        "imageUrl": image_url,
        "createdAt": created_at,
        "updatedAt": created_at,
    }))
}

/// A record in the intermediate shape, with an `imageUrls` list
pub fn legacy_url_list_doc(name: &str, created_at: &str, image_urls: &[&str]) -> Document {
    doc(serde_json::json!({
        "name": name,
        "description": "",
        "brand": "Royal Essentials",
        "price": 79.99,
        "color": "Blue",
        "size": "L",
        "type": "Shirt",
        "imageUrls": image_urls,
        "createdAt": created_at,
        "updatedAt": created_at,
    }))
}

// ---------------------------------------------------------------------------
// Failure injection and call counting
// ---------------------------------------------------------------------------

/// Blob store that accepts `allowed_puts` uploads, then fails every put
///
/// Optionally fails every delete too. Stored blobs land in `inner`.
pub struct FlakyBlobStore {
    pub inner: InMemoryBlobStore,
    allowed_puts: AtomicUsize,
    fail_deletes: bool,
}

impl FlakyBlobStore {
    pub fn failing_after(inner: InMemoryBlobStore, allowed_puts: usize) -> Self {
        Self {
            inner,
            allowed_puts: AtomicUsize::new(allowed_puts),
            fail_deletes: false,
        }
    }

    pub fn failing_deletes(inner: InMemoryBlobStore) -> Self {
        Self {
            inner,
            allowed_puts: AtomicUsize::new(usize::MAX),
            fail_deletes: true,
        }
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put(&self, key: &str, upload: &ImageUpload) -> Result<String> {
        let allowed = self
            .allowed_puts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if allowed.is_err() {
            bail!("Injected upload failure for {}", key);
        }
        self.inner.put(key, upload).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes {
            bail!("Injected delete failure for {}", key);
        }
        self.inner.delete(key).await
    }

    fn resolve_key(&self, url: &str) -> Option<String> {
        self.inner.resolve_key(url)
    }
}

/// Document collection wrapper that counts queries and can fail inserts
pub struct CountingCollection {
    inner: Arc<dyn DocumentCollection>,
    queries: AtomicUsize,
    fail_inserts: bool,
}

impl CountingCollection {
    pub fn new(inner: Arc<dyn DocumentCollection>) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
            fail_inserts: false,
        }
    }

    pub fn failing_inserts(inner: Arc<dyn DocumentCollection>) -> Self {
        Self {
            fail_inserts: true,
            ..Self::new(inner)
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentCollection for CountingCollection {
    async fn insert(&self, doc: Document) -> Result<String> {
        if self.fail_inserts {
            bail!("Injected insert failure");
        }
        self.inner.insert(doc).await
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        self.inner.get(id).await
    }

    async fn update(&self, id: &str, fields: Document) -> Result<bool> {
        self.inner.update(id, fields).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<(String, Document)>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(query).await
    }

    fn query_limits(&self) -> QueryLimits {
        self.inner.query_limits()
    }
}

// ---------------------------------------------------------------------------
// Assertions helpers
// ---------------------------------------------------------------------------

/// Assert that a list contains exactly `n` items.
pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} items, got {}",
        expected,
        list.len()
    );
}

/// Assert that items are ordered by descending creation time
pub fn assert_newest_first(items: &[storefront::core::item::Item]) {
    for pair in items.windows(2) {
        assert!(
            pair[0].created_at >= pair[1].created_at,
            "'{}' ({}) listed before newer '{}' ({})",
            pair[0].name,
            pair[0].created_at,
            pair[1].name,
            pair[1].created_at
        );
    }
}
