//! Form loading and saving functionality
//!
//! [`FormStore`] is the persistence collaborator used by the builder and
//! renderer sessions. [`DocumentFormStore`] implements it on top of any
//! [`StorageBackend`](crate::storage::StorageBackend).

pub mod document;

pub use document::{DEFAULT_DOCUMENT_KEY, DocumentFormStore};

use crate::models::FormConfiguration;
use crate::storage::StorageError;
use async_trait::async_trait;

/// Whole-document persistence of a form configuration
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Persist the configuration, replacing whatever was stored before.
    ///
    /// May fail transiently; callers treat failure as recoverable.
    async fn save(&self, configuration: &FormConfiguration) -> Result<(), StorageError>;

    /// Load the persisted configuration.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<FormConfiguration>, StorageError>;
}
