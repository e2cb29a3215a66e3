//! The item store: catalogue records plus their image collections
//!
//! [`ItemStore`] is the single entry point the presentation layer uses. It
//! combines a [`DocumentCollection`] holding item records with a
//! [`BlobStore`] holding their images, and keeps the two consistent:
//!
//! - a record is only persisted once all of its images are uploaded
//! - uploads from a failed create or update are removed again
//! - images dropped by an update, or belonging to a deleted item, are removed
//!   from the blob store on a best-effort basis
//!
//! All failures surface as [`CatalogueError`].

use crate::core::error::{CatalogueError, CatalogueResult, ValidationError};
use crate::core::filter::FilterSelection;
use crate::core::item::{ImageRef, ImageUpload, Item, ItemFields, ItemPatch, timestamp_value};
use crate::core::query::DocumentQuery;
use crate::core::service::{BlobStore, Document, DocumentCollection};
use crate::core::validation::{validate_fields, validate_patch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Default blob key prefix for item images
pub const DEFAULT_IMAGE_PREFIX: &str = "clothing";

/// Where a filter selection is evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStrategy {
    /// Fetch every record newest first and filter locally
    #[default]
    InMemory,

    /// Translate the selection into a query run by the collection
    ServerSide,
}

/// Catalogue item store
#[derive(Clone)]
pub struct ItemStore {
    collection: Arc<dyn DocumentCollection>,
    blobs: Arc<dyn BlobStore>,
    strategy: FilterStrategy,
    image_prefix: String,
}

impl ItemStore {
    pub fn new(collection: Arc<dyn DocumentCollection>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            collection,
            blobs,
            strategy: FilterStrategy::default(),
            image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
        }
    }

    pub fn with_strategy(mut self, strategy: FilterStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the prefix under which uploaded images are stored
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_prefix = prefix.into();
        self
    }

    pub fn strategy(&self) -> FilterStrategy {
        self.strategy
    }

    pub fn image_prefix(&self) -> &str {
        &self.image_prefix
    }

    /// List items matching `filter`, newest first
    ///
    /// `None` or an empty selection lists everything. A single undecodable
    /// record fails the whole call.
    pub async fn list(&self, filter: Option<&FilterSelection>) -> CatalogueResult<Vec<Item>> {
        let selection = filter.filter(|selection| !selection.is_empty());

        let items = match (self.strategy, selection) {
            (_, None) => self.run_query(&DocumentQuery::all_newest_first()).await?,
            (FilterStrategy::InMemory, Some(selection)) => {
                let all = self.run_query(&DocumentQuery::all_newest_first()).await?;
                selection.apply(all)
            }
            (FilterStrategy::ServerSide, Some(selection)) => {
                let limits = self.collection.query_limits();
                let query = DocumentQuery::from_selection(selection, &limits)?;
                self.run_query(&query).await?
            }
        };

        tracing::debug!(
            count = items.len(),
            strategy = ?self.strategy,
            filtered = selection.is_some(),
            "Listed items"
        );
        Ok(items)
    }

    /// Get a single item by id
    pub async fn get(&self, id: &str) -> CatalogueResult<Option<Item>> {
        let doc = self
            .collection
            .get(id)
            .await
            .map_err(|e| CatalogueError::store("load item", e))?;

        tracing::debug!(item_id = %id, found = doc.is_some(), "Loaded item");

        doc.map(|doc| Item::from_document(id, doc))
            .transpose()
            .map_err(|e| CatalogueError::store("decode item", e))
    }

    /// Create an item with its images and return the new id
    ///
    /// Images are uploaded in order before the record is written. If any
    /// upload or the insert fails, images already uploaded by this call are
    /// deleted again.
    pub async fn create(
        &self,
        fields: ItemFields,
        images: Vec<ImageUpload>,
    ) -> CatalogueResult<String> {
        validate_fields(&fields)?;
        if images.is_empty() {
            return Err(ValidationError::NoImages.into());
        }

        let now = Utc::now();
        let refs = self.upload_all(&images, now).await?;

        let doc = match fields.to_document(&refs, now, now) {
            Ok(doc) => doc,
            Err(e) => {
                self.discard_uploads(&refs).await;
                return Err(CatalogueError::store("encode item", e));
            }
        };

        let id = match self.collection.insert(doc).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, name = %fields.name, "Failed to insert item");
                self.discard_uploads(&refs).await;
                return Err(CatalogueError::store("create item", e));
            }
        };

        tracing::info!(item_id = %id, name = %fields.name, images = refs.len(), "Created item");
        Ok(id)
    }

    /// Create an item whose images are already hosted
    ///
    /// Nothing is uploaded; the references are stored as given.
    pub async fn import(&self, fields: ItemFields, images: Vec<ImageRef>) -> CatalogueResult<String> {
        validate_fields(&fields)?;
        if images.is_empty() {
            return Err(ValidationError::NoImages.into());
        }

        let now = Utc::now();
        let doc = fields
            .to_document(&images, now, now)
            .map_err(|e| CatalogueError::store("encode item", e))?;
        let id = self
            .collection
            .insert(doc)
            .await
            .map_err(|e| CatalogueError::store("create item", e))?;

        tracing::info!(item_id = %id, name = %fields.name, "Imported item");
        Ok(id)
    }

    /// Apply a partial update and append newly uploaded images
    ///
    /// The final image list is `patch.images` (or the stored list when the
    /// patch leaves images alone) followed by `new_images`. Stored images that
    /// are no longer referenced are removed from the blob store once the
    /// record is updated.
    pub async fn update(
        &self,
        id: &str,
        patch: ItemPatch,
        new_images: Vec<ImageUpload>,
    ) -> CatalogueResult<()> {
        validate_patch(&patch)?;

        let current = self.get(id).await?.ok_or_else(|| CatalogueError::NotFound {
            id: id.to_string(),
        })?;

        let kept = match &patch.images {
            Some(kept) => self.match_stored(kept, &current.images),
            None => current.images.clone(),
        };
        if kept.is_empty() && new_images.is_empty() {
            return Err(ValidationError::NoImages.into());
        }

        let now = Utc::now();
        let uploaded = self.upload_all(&new_images, now).await?;
        let images: Vec<ImageRef> = kept.into_iter().chain(uploaded.iter().cloned()).collect();

        let doc = match update_document(&patch, &images, now) {
            Ok(doc) => doc,
            Err(e) => {
                self.discard_uploads(&uploaded).await;
                return Err(CatalogueError::store("encode item", e));
            }
        };

        match self.collection.update(id, doc).await {
            Ok(true) => {}
            Ok(false) => {
                self.discard_uploads(&uploaded).await;
                return Err(CatalogueError::NotFound { id: id.to_string() });
            }
            Err(e) => {
                tracing::error!(item_id = %id, error = %e, "Failed to update item");
                self.discard_uploads(&uploaded).await;
                return Err(CatalogueError::store("update item", e));
            }
        }

        let retained: HashSet<String> = images.iter().map(|image| self.identity(image)).collect();
        let replaced: Vec<ImageRef> = current
            .images
            .into_iter()
            .filter(|image| !retained.contains(&self.identity(image)))
            .collect();
        self.remove_images(id, &replaced).await;

        tracing::info!(
            item_id = %id,
            images = images.len(),
            added = uploaded.len(),
            removed = replaced.len(),
            "Updated item"
        );
        Ok(())
    }

    /// Delete an item and the given images
    ///
    /// Image deletion is best-effort: failures are logged and skipped, and
    /// the record is deleted regardless. Deleting an absent id succeeds.
    pub async fn delete(&self, id: &str, images: &[ImageRef]) -> CatalogueResult<()> {
        self.remove_images(id, images).await;

        self.collection.delete(id).await.map_err(|e| {
            tracing::error!(item_id = %id, error = %e, "Failed to delete item");
            CatalogueError::store("delete item", e)
        })?;

        tracing::info!(item_id = %id, images = images.len(), "Deleted item");
        Ok(())
    }

    /// Delete an item together with the images its record references
    pub async fn delete_item(&self, id: &str) -> CatalogueResult<()> {
        let images = match self.get(id).await {
            Ok(Some(item)) => item.images,
            Ok(None) => Vec::new(),
            // An undecodable record is still removed, its images are left behind
            Err(CatalogueError::Store {
                operation: "decode item",
                source,
            }) => {
                tracing::warn!(item_id = %id, error = %source, "Deleting undecodable item without its images");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        self.delete(id, &images).await
    }

    async fn run_query(&self, query: &DocumentQuery) -> CatalogueResult<Vec<Item>> {
        let docs = self
            .collection
            .query(query)
            .await
            .map_err(|e| CatalogueError::store("list items", e))?;

        docs.into_iter()
            .map(|(id, doc)| Item::from_document(id, doc))
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| CatalogueError::store("decode items", e))
    }

    /// Upload sequentially, stopping at the first failure
    async fn upload_all(
        &self,
        uploads: &[ImageUpload],
        at: DateTime<Utc>,
    ) -> CatalogueResult<Vec<ImageRef>> {
        let mut refs = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let key = upload.storage_key(&self.image_prefix, at);
            match self.blobs.put(&key, upload).await {
                Ok(url) => {
                    tracing::debug!(key = %key, file = %upload.file_name, "Uploaded image");
                    refs.push(ImageRef::stored(key, url));
                }
                Err(e) => {
                    tracing::error!(key = %key, file = %upload.file_name, error = %e, "Image upload failed");
                    self.discard_uploads(&refs).await;
                    return Err(CatalogueError::store("upload image", e));
                }
            }
        }

        Ok(refs)
    }

    /// Remove blobs uploaded by an operation that is being abandoned
    async fn discard_uploads(&self, refs: &[ImageRef]) {
        for image in refs {
            let Some(key) = &image.path else { continue };
            if let Err(e) = self.blobs.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to clean up uploaded image");
            }
        }
    }

    async fn remove_images(&self, id: &str, images: &[ImageRef]) {
        for image in images {
            let Some(key) = self.blob_key(image) else {
                tracing::warn!(item_id = %id, url = %image.url, "Image has no blob key, skipping");
                continue;
            };
            if let Err(e) = self.blobs.delete(&key).await {
                tracing::warn!(item_id = %id, key = %key, error = %e, "Failed to delete image");
            }
        }
    }

    /// What makes two references the same image: its blob key, else its URL
    fn identity(&self, image: &ImageRef) -> String {
        self.blob_key(image).unwrap_or_else(|| image.url.clone())
    }

    /// Swap each kept reference for the stored one it names
    ///
    /// Callers may echo images back by URL alone; the stored reference keeps
    /// the blob key.
    fn match_stored(&self, kept: &[ImageRef], stored: &[ImageRef]) -> Vec<ImageRef> {
        kept.iter()
            .map(|image| {
                let identity = self.identity(image);
                stored
                    .iter()
                    .find(|candidate| {
                        candidate.url == image.url || self.identity(candidate) == identity
                    })
                    .cloned()
                    .unwrap_or_else(|| image.clone())
            })
            .collect()
    }

    fn blob_key(&self, image: &ImageRef) -> Option<String> {
        image
            .path
            .clone()
            .or_else(|| self.blobs.resolve_key(&image.url))
    }
}

fn update_document(
    patch: &ItemPatch,
    images: &[ImageRef],
    updated_at: DateTime<Utc>,
) -> anyhow::Result<Document> {
    let mut doc = patch.scalar_document()?;
    doc.insert("images".to_string(), serde_json::to_value(images)?);
    doc.insert("updatedAt".to_string(), timestamp_value(updated_at));
    Ok(doc)
}
