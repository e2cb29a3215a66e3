//! MongoDB document collection using the official MongoDB async driver.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! storefront = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Serialization strategy
//!
//! Documents are converted between `serde_json` objects and BSON. Ids are
//! MongoDB `ObjectId`s, exposed as their hex string; records created by other
//! tools with plain string ids are still addressable. Prices stay BSON
//! doubles so range constraints run on the server, and timestamps are
//! fixed-width RFC 3339 strings so the `createdAt` sort is chronological.

use crate::core::query::{Constraint, Direction, DocumentQuery, QueryLimits};
use crate::core::service::{Document, DocumentCollection};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::{self, Bson, doc, oid::ObjectId};

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a JSON object into a BSON document, dropping any `_id` key
fn json_to_bson(doc: Document) -> Result<bson::Document> {
    let bson_val = bson::to_bson(&serde_json::Value::Object(doc))
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };
    doc.remove("_id");

    Ok(doc)
}

/// Split a BSON document into its id string and JSON body
fn bson_to_json(mut doc: bson::Document) -> Result<(String, Document)> {
    let id = match doc.remove("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(s)) => s,
        Some(other) => other.to_string(),
        None => return Err(anyhow!("Document has no _id")),
    };

    match Bson::Document(doc).into_relaxed_extjson() {
        serde_json::Value::Object(map) => Ok((id, map)),
        _ => Err(anyhow!("Document '{}' did not convert to a JSON object", id)),
    }
}

/// Match on the ObjectId form of `id` when it parses, and on the raw string
fn id_filter(id: &str) -> bson::Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => {
            let candidates = vec![Bson::ObjectId(oid), Bson::String(id.to_string())];
            doc! { "_id": { "$in": candidates } }
        }
        Err(_) => doc! { "_id": id },
    }
}

fn json_to_bson_value(value: &serde_json::Value) -> Result<Bson> {
    bson::to_bson(value).map_err(|e| anyhow!("Failed to convert query value: {}", e))
}

/// Translate a document query into a MongoDB filter
fn query_filter(query: &DocumentQuery) -> Result<bson::Document> {
    let mut filter = bson::Document::new();

    for constraint in &query.constraints {
        match constraint {
            Constraint::Range { field, min, max } => {
                let mut range = bson::Document::new();
                if let Some(min) = min {
                    range.insert("$gte", json_to_bson_value(min)?);
                }
                if let Some(max) = max {
                    range.insert("$lte", json_to_bson_value(max)?);
                }
                filter.insert(field.as_str(), range);
            }
            Constraint::In { field, values } => {
                let values = values
                    .iter()
                    .map(json_to_bson_value)
                    .collect::<Result<Vec<_>>>()?;
                filter.insert(field.as_str(), doc! { "$in": values });
            }
        }
    }

    Ok(filter)
}

fn query_sort(query: &DocumentQuery) -> Option<bson::Document> {
    query.order.as_ref().map(|order| {
        let direction = match order.direction {
            Direction::Asc => 1,
            Direction::Desc => -1,
        };
        let field = order.field.as_str();
        // ObjectIds grow with insertion time and break ties
        doc! { field: direction, "_id": direction }
    })
}

// ---------------------------------------------------------------------------
// MongoDocumentCollection
// ---------------------------------------------------------------------------

/// Document collection backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use storefront::storage::MongoDocumentCollection;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let collection = MongoDocumentCollection::new(client.database("storefront"), "clothing");
/// let id = collection.insert(doc).await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoDocumentCollection {
    database: Database,
    name: String,
}

impl MongoDocumentCollection {
    /// Create a collection handle for `name` in `database`.
    pub fn new(database: Database, name: impl Into<String>) -> Self {
        Self {
            database,
            name: name.into(),
        }
    }

    /// Connect using a MongoDB URI
    pub async fn connect(uri: &str, database: &str, name: impl Into<String>) -> Result<Self> {
        let client = mongodb::Client::with_uri_str(uri)
            .await
            .map_err(|e| anyhow!("Failed to connect to MongoDB: {}", e))?;
        Ok(Self::new(client.database(database), name))
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self) -> mongodb::Collection<bson::Document> {
        self.database.collection(&self.name)
    }

    /// Create the index backing the newest-first listing.
    ///
    /// This method is idempotent, safe to call on every startup.
    pub async fn ensure_indexes(&self) -> Result<()> {
        use mongodb::IndexModel;

        self.collection()
            .create_index(IndexModel::builder().keys(doc! { "createdAt": -1 }).build())
            .await
            .map_err(|e| anyhow!("Failed to create index on '{}': {}", self.name, e))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentCollection for MongoDocumentCollection {
    async fn insert(&self, doc: Document) -> Result<String> {
        let oid = ObjectId::new();
        let mut doc = json_to_bson(doc)?;
        doc.insert("_id", oid);

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| anyhow!("Failed to insert document: {}", e))?;

        Ok(oid.to_hex())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let doc = self
            .collection()
            .find_one(id_filter(id))
            .await
            .map_err(|e| anyhow!("Failed to get document: {}", e))?;

        doc.map(|d| bson_to_json(d).map(|(_, body)| body)).transpose()
    }

    /// Returns `false` when no document matched the id.
    async fn update(&self, id: &str, fields: Document) -> Result<bool> {
        let fields = json_to_bson(fields)?;
        if fields.is_empty() {
            return Ok(self.get(id).await?.is_some());
        }

        let result = self
            .collection()
            .update_one(id_filter(id), doc! { "$set": fields })
            .await
            .map_err(|e| anyhow!("Failed to update document: {}", e))?;

        Ok(result.matched_count > 0)
    }

    /// Silently succeeds if the document does not exist (idempotent).
    async fn delete(&self, id: &str) -> Result<()> {
        self.collection()
            .delete_one(id_filter(id))
            .await
            .map_err(|e| anyhow!("Failed to delete document: {}", e))?;

        Ok(())
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<(String, Document)>> {
        let collection = self.collection();
        let mut find = collection.find(query_filter(query)?);
        if let Some(sort) = query_sort(query) {
            find = find.sort(sort);
        }

        let cursor = find
            .await
            .map_err(|e| anyhow!("Failed to query documents: {}", e))?;

        let docs: Vec<bson::Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect documents: {}", e))?;

        docs.into_iter().map(bson_to_json).collect()
    }

    /// MongoDB combines any number of range and `$in` clauses
    fn query_limits(&self) -> QueryLimits {
        QueryLimits::unlimited()
    }
}
