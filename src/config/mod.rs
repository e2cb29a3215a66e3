//! Configuration loading and management
//!
//! Configuration is read from YAML, then selected values can be overridden
//! from the environment:
//!
//! | Variable                      | Effect                                        |
//! |-------------------------------|-----------------------------------------------|
//! | `STOREFRONT_ADMIN_PASSWORD`   | admin secret                                  |
//! | `STOREFRONT_MONGODB_URI`      | selects the MongoDB backend with this URI     |
//! | `STOREFRONT_BLOB_ROOT`        | selects the filesystem blob store at this dir |
//! | `STOREFRONT_PUBLIC_BASE_URL`  | public URL prefix of stored images            |
//!
//! ```yaml
//! admin_password: change-me
//! catalogue:
//!   collection: clothing
//!   image_prefix: clothing
//!   filter_strategy: in_memory
//! documents:
//!   backend: mongodb
//!   uri: mongodb://localhost:27017
//!   database: storefront
//! blobs:
//!   backend: filesystem
//!   root: /var/lib/storefront/images
//!   public_base_url: https://cdn.example.com/images
//! ```

use crate::core::auth::AdminGate;
use crate::core::error::ConfigError;
use crate::core::store::{DEFAULT_IMAGE_PREFIX, FilterStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_ADMIN_PASSWORD: &str = "STOREFRONT_ADMIN_PASSWORD";
pub const ENV_MONGODB_URI: &str = "STOREFRONT_MONGODB_URI";
pub const ENV_BLOB_ROOT: &str = "STOREFRONT_BLOB_ROOT";
pub const ENV_PUBLIC_BASE_URL: &str = "STOREFRONT_PUBLIC_BASE_URL";

const DEFAULT_COLLECTION: &str = "clothing";
const DEFAULT_DATABASE: &str = "storefront";
const DEFAULT_MEMORY_BASE_URL: &str = "memory://blobs";

/// Complete storefront configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Shared admin secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,

    #[serde(default)]
    pub catalogue: CatalogueConfig,

    #[serde(default)]
    pub documents: DocumentStoreConfig,

    #[serde(default)]
    pub blobs: BlobStoreConfig,
}

/// Catalogue behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// Name of the item collection
    pub collection: String,

    /// Blob key prefix for uploaded images
    pub image_prefix: String,

    pub filter_strategy: FilterStrategy,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            image_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
            filter_strategy: FilterStrategy::default(),
        }
    }
}

/// Document collection backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum DocumentStoreConfig {
    #[default]
    InMemory,

    Mongodb {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uri: Option<String>,

        #[serde(default = "default_database")]
        database: String,
    },
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

/// Blob store backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BlobStoreConfig {
    InMemory {
        #[serde(default = "default_memory_base_url")]
        base_url: String,
    },

    Filesystem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root: Option<PathBuf>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_base_url: Option<String>,
    },
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        BlobStoreConfig::InMemory {
            base_url: default_memory_base_url(),
        }
    }
}

fn default_memory_base_url() -> String {
    DEFAULT_MEMORY_BASE_URL.to_string()
}

impl StorefrontConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load the optional file, apply process environment overrides and
    /// validate the result
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        tracing::info!(
            collection = %config.catalogue.collection,
            strategy = ?config.catalogue.filter_strategy,
            documents = config.documents.backend_name(),
            blobs = config.blobs.backend_name(),
            "Loaded storefront configuration"
        );
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// Blank values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(password) = read(ENV_ADMIN_PASSWORD) {
            self.admin_password = Some(password);
        }

        if let Some(new_uri) = read(ENV_MONGODB_URI) {
            self.documents = match self.documents {
                DocumentStoreConfig::Mongodb { database, .. } => DocumentStoreConfig::Mongodb {
                    uri: Some(new_uri),
                    database,
                },
                DocumentStoreConfig::InMemory => DocumentStoreConfig::Mongodb {
                    uri: Some(new_uri),
                    database: default_database(),
                },
            };
        }

        if let Some(new_root) = read(ENV_BLOB_ROOT) {
            let public_base_url = match &self.blobs {
                BlobStoreConfig::Filesystem {
                    public_base_url, ..
                } => public_base_url.clone(),
                BlobStoreConfig::InMemory { .. } => None,
            };
            self.blobs = BlobStoreConfig::Filesystem {
                root: Some(PathBuf::from(new_root)),
                public_base_url,
            };
        }

        if let Some(url) = read(ENV_PUBLIC_BASE_URL) {
            match &mut self.blobs {
                BlobStoreConfig::InMemory { base_url } => *base_url = url,
                BlobStoreConfig::Filesystem {
                    public_base_url, ..
                } => *public_base_url = Some(url),
            }
        }

        self
    }

    /// Check that every required value is present
    ///
    /// All missing values are reported together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();

        if self.admin_secret().is_none() {
            missing.push(format!("admin_password ({})", ENV_ADMIN_PASSWORD));
        }
        if self.catalogue.collection.trim().is_empty() {
            missing.push("catalogue.collection".to_string());
        }
        if let DocumentStoreConfig::Mongodb { uri, database } = &self.documents {
            if is_blank(uri.as_deref()) {
                missing.push(format!("documents.uri ({})", ENV_MONGODB_URI));
            }
            if database.trim().is_empty() {
                missing.push("documents.database".to_string());
            }
        }
        if let BlobStoreConfig::Filesystem {
            root,
            public_base_url,
        } = &self.blobs
        {
            if root.is_none() {
                missing.push(format!("blobs.root ({})", ENV_BLOB_ROOT));
            }
            if is_blank(public_base_url.as_deref()) {
                missing.push(format!("blobs.public_base_url ({})", ENV_PUBLIC_BASE_URL));
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingFields { fields: missing });
        }

        if self.catalogue.image_prefix.split('/').any(|part| part == "..") {
            return Err(ConfigError::InvalidValue {
                field: "catalogue.image_prefix".to_string(),
                value: self.catalogue.image_prefix.clone(),
                message: "must not contain '..' segments".to_string(),
            });
        }

        Ok(())
    }

    /// The configured admin secret, if set and not blank
    pub fn admin_secret(&self) -> Option<&str> {
        self.admin_password
            .as_deref()
            .filter(|secret| !secret.trim().is_empty())
    }

    /// Admin gate over the configured secret
    ///
    /// With no secret configured the gate admits nobody.
    pub fn admin_gate(&self) -> AdminGate {
        AdminGate::new(self.admin_secret().unwrap_or_default())
    }
}

impl DocumentStoreConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            DocumentStoreConfig::InMemory => "in_memory",
            DocumentStoreConfig::Mongodb { .. } => "mongodb",
        }
    }
}

impl BlobStoreConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            BlobStoreConfig::InMemory { .. } => "in_memory",
            BlobStoreConfig::Filesystem { .. } => "filesystem",
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
