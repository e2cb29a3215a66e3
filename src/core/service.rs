//! Service traits for the document collection and blob store backends

use crate::core::item::ImageUpload;
use crate::core::query::{DocumentQuery, QueryLimits};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A stored document: a JSON object without its id
pub type Document = Map<String, Value>;

/// Service trait for a collection of documents
///
/// Implementations assign ids on insert and report absence through their
/// return values rather than through errors, so the item store can tell a
/// missing record from a failing backend.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Insert a document and return the generated id
    async fn insert(&self, doc: Document) -> Result<String>;

    /// Get a document by id
    async fn get(&self, id: &str) -> Result<Option<Document>>;

    /// Merge `fields` into an existing document
    ///
    /// Returns `false` if no document has this id.
    async fn update(&self, id: &str, fields: Document) -> Result<bool>;

    /// Delete a document
    ///
    /// Silently succeeds if the document does not exist.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Run a query and return `(id, document)` pairs in the requested order
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<(String, Document)>>;

    /// Constraint limits this collection's query engine enforces
    fn query_limits(&self) -> QueryLimits {
        QueryLimits::default()
    }
}

/// Service trait for binary object storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob under `key` and return its public URL
    async fn put(&self, key: &str, upload: &ImageUpload) -> Result<String>;

    /// Delete the blob stored under `key`
    async fn delete(&self, key: &str) -> Result<()>;

    /// Map one of this store's public URLs back to its key
    ///
    /// Only used for references that were persisted without a key. Stores
    /// that cannot recognise their own URLs return `None`.
    fn resolve_key(&self, _url: &str) -> Option<String> {
        None
    }
}
