//! In-memory document collection and blob store for testing and development

use crate::core::item::ImageUpload;
use crate::core::query::{Direction, DocumentQuery, QueryLimits, compare_values};
use crate::core::service::{BlobStore, Document, DocumentCollection};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Clone)]
struct StoredDocument {
    /// Insertion sequence, breaks ordering ties
    seq: u64,
    doc: Document,
}

/// In-memory document collection
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// clones share the same storage.
#[derive(Clone)]
pub struct InMemoryDocumentCollection {
    docs: Arc<RwLock<HashMap<String, StoredDocument>>>,
    next_seq: Arc<AtomicU64>,
    limits: QueryLimits,
}

impl InMemoryDocumentCollection {
    /// Create an empty collection with no query limits
    pub fn new() -> Self {
        Self::with_limits(QueryLimits::unlimited())
    }

    /// Create an empty collection that enforces the given query limits,
    /// to mimic a managed document store
    pub fn with_limits(limits: QueryLimits) -> Self {
        Self {
            docs: Arc::new(RwLock::new(HashMap::new())),
            next_seq: Arc::new(AtomicU64::new(0)),
            limits,
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.docs.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDocumentCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentCollection for InMemoryDocumentCollection {
    async fn insert(&self, doc: Document) -> Result<String> {
        let mut docs = self
            .docs
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let id = Uuid::new_v4().simple().to_string();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        docs.insert(id.clone(), StoredDocument { seq, doc });

        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let docs = self
            .docs
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(docs.get(id).map(|stored| stored.doc.clone()))
    }

    async fn update(&self, id: &str, fields: Document) -> Result<bool> {
        let mut docs = self
            .docs
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(stored) = docs.get_mut(id) else {
            return Ok(false);
        };
        stored.doc.extend(fields);

        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut docs = self
            .docs
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        docs.remove(id);

        Ok(())
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<(String, Document)>> {
        query.check_limits(&self.limits)?;

        let docs = self
            .docs
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut matched: Vec<(&String, &StoredDocument)> = docs
            .iter()
            .filter(|(_, stored)| query.matches(&stored.doc))
            .collect();

        match &query.order {
            Some(order) => matched.sort_by(|(_, a), (_, b)| {
                let by_field = match (a.doc.get(&order.field), b.doc.get(&order.field)) {
                    (Some(x), Some(y)) => compare_values(x, y),
                    (x, y) => x.is_some().cmp(&y.is_some()),
                };
                let ordering = by_field.then(a.seq.cmp(&b.seq));
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            }),
            None => matched.sort_by_key(|(_, stored)| stored.seq),
        }

        Ok(matched
            .into_iter()
            .map(|(id, stored)| (id.clone(), stored.doc.clone()))
            .collect())
    }

    fn query_limits(&self) -> QueryLimits {
        self.limits
    }
}

/// A blob held by [`InMemoryBlobStore`]
#[derive(Clone, Debug)]
pub struct StoredBlob {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// In-memory blob store
///
/// Public URLs have the form `<base_url>/<key>`.
#[derive(Clone)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, StoredBlob>>>,
    base_url: String,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::with_base_url("memory://blobs")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a stored blob by key
    pub fn get(&self, key: &str) -> Option<StoredBlob> {
        self.blobs.read().ok()?.get(key).cloned()
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .blobs
            .read()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, upload: &ImageUpload) -> Result<String> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        blobs.insert(
            key.to_string(),
            StoredBlob {
                bytes: upload.bytes.clone(),
                content_type: upload.content_type.clone(),
            },
        );

        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        blobs
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| anyhow!("Blob not found: {}", key))
    }

    fn resolve_key(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.base_url)?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}
