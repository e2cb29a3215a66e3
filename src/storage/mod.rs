//! Storage implementations for different backends

pub mod filesystem;
pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;

pub use filesystem::FsBlobStore;
pub use in_memory::{InMemoryBlobStore, InMemoryDocumentCollection};
#[cfg(feature = "mongodb_backend")]
pub use mongodb::MongoDocumentCollection;

use crate::config::{BlobStoreConfig, DocumentStoreConfig, StorefrontConfig};
use crate::core::error::{CatalogueError, CatalogueResult, ConfigError};
use crate::core::service::{BlobStore, DocumentCollection};
use crate::core::store::ItemStore;
use std::sync::Arc;

/// Build an item store from configuration
pub async fn open_item_store(config: &StorefrontConfig) -> CatalogueResult<ItemStore> {
    let collection = open_collection(config).await?;
    let blobs = open_blob_store(&config.blobs)?;

    Ok(ItemStore::new(collection, blobs)
        .with_strategy(config.catalogue.filter_strategy)
        .with_image_prefix(config.catalogue.image_prefix.clone()))
}

async fn open_collection(config: &StorefrontConfig) -> CatalogueResult<Arc<dyn DocumentCollection>> {
    match &config.documents {
        DocumentStoreConfig::InMemory => Ok(Arc::new(InMemoryDocumentCollection::new())),

        #[cfg(feature = "mongodb_backend")]
        DocumentStoreConfig::Mongodb { uri, database } => {
            let uri = uri.as_deref().ok_or_else(|| ConfigError::MissingFields {
                fields: vec!["documents.uri".to_string()],
            })?;
            let collection =
                MongoDocumentCollection::connect(uri, database, config.catalogue.collection.clone())
                    .await
                    .map_err(|e| CatalogueError::store("connect to document store", e))?;
            collection
                .ensure_indexes()
                .await
                .map_err(|e| CatalogueError::store("create indexes", e))?;
            Ok(Arc::new(collection))
        }

        #[allow(unreachable_patterns)]
        other => Err(unavailable("documents.backend", other.backend_name())),
    }
}

fn open_blob_store(config: &BlobStoreConfig) -> CatalogueResult<Arc<dyn BlobStore>> {
    match config {
        BlobStoreConfig::InMemory { base_url } => {
            Ok(Arc::new(InMemoryBlobStore::with_base_url(base_url.clone())))
        }
        BlobStoreConfig::Filesystem {
            root: Some(root),
            public_base_url: Some(url),
        } => Ok(Arc::new(FsBlobStore::new(root.clone(), url.clone()))),
        BlobStoreConfig::Filesystem {
            root,
            public_base_url,
        } => {
            let mut fields = Vec::new();
            if root.is_none() {
                fields.push("blobs.root".to_string());
            }
            if public_base_url.is_none() {
                fields.push("blobs.public_base_url".to_string());
            }
            Err(ConfigError::MissingFields { fields }.into())
        }
    }
}

fn unavailable(field: &str, backend: &str) -> CatalogueError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: backend.to_string(),
        message: "backend not enabled in this build".to_string(),
    }
    .into()
}
