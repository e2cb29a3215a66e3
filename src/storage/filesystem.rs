//! Filesystem blob store
//!
//! Blobs are written under a root directory using their key as the relative
//! path, and served from `public_base_url` by whatever fronts that directory.

use crate::core::item::ImageUpload;
use crate::core::service::BlobStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Blob store backed by a local directory
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a key, refusing keys that escape the root
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(anyhow!("Invalid blob key: {}", key));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, upload: &ImageUpload) -> Result<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow!("Failed to create directory {}: {}", parent.display(), e))?;
        }

        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| anyhow!("Failed to write blob {}: {}", path.display(), e))?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| anyhow!("Failed to delete blob {}: {}", path.display(), e))
    }

    fn resolve_key(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(&self.public_base_url)?.strip_prefix('/')?;
        self.path_for(key).ok().map(|_| key.to_string())
    }
}
