//! JSON document store
//!
//! Saves and loads a form configuration as a single JSON document
//! (`{"fields": [...]}`) under one storage key.

use super::FormStore;
use crate::models::FormConfiguration;
use crate::storage::{StorageBackend, StorageError};
use async_trait::async_trait;
use tracing::{info, warn};

/// Storage key used when none is given
pub const DEFAULT_DOCUMENT_KEY: &str = "form_config";

/// Form store that serializes configurations into a storage backend
pub struct DocumentFormStore<B: StorageBackend> {
    storage: B,
    key: String,
}

impl<B: StorageBackend> DocumentFormStore<B> {
    /// Create a store using [`DEFAULT_DOCUMENT_KEY`]
    pub fn new(storage: B) -> Self {
        Self::with_key(storage, DEFAULT_DOCUMENT_KEY)
    }

    pub fn with_key(storage: B, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &B {
        &self.storage
    }
}

#[async_trait]
impl<B: StorageBackend> FormStore for DocumentFormStore<B> {
    async fn save(&self, configuration: &FormConfiguration) -> Result<(), StorageError> {
        let content = serde_json::to_vec(configuration).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize form: {}", e))
        })?;

        self.storage.write(&self.key, &content).await?;

        info!(
            "Saved form with {} field(s) to '{}'",
            configuration.len(),
            self.key
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<FormConfiguration>, StorageError> {
        let Some(content) = self.storage.read(&self.key).await? else {
            info!("No form stored under '{}'", self.key);
            return Ok(None);
        };

        let configuration: FormConfiguration = serde_json::from_slice(&content).map_err(|e| {
            warn!("Stored form under '{}' is malformed: {}", self.key, e);
            StorageError::SerializationError(format!("Failed to parse stored form: {}", e))
        })?;

        info!(
            "Loaded form with {} field(s) from '{}'",
            configuration.len(),
            self.key
        );
        Ok(Some(configuration))
    }
}
