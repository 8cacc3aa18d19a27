//! Storage backend abstraction
//!
//! Defines the StorageBackend trait and implementations for different storage systems:
//! - MemoryStorageBackend: in-process key-value store with simulated latency/failure
//! - FileSystemStorageBackend: native file system, one file per key (feature `native-fs`)
//!
//! Backends store whole documents by key; there is no partial or field-level access.

use async_trait::async_trait;

pub mod memory;

#[cfg(feature = "native-fs")]
pub mod filesystem;

pub use memory::{MemoryStorageBackend, SimulationConfig};

/// Error type for storage operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("{0}")]
    BackendError(String),
}

/// Trait for storage backends
///
/// Reading a key that was never written is not an error: `read` returns
/// `Ok(None)`. Errors are reserved for genuine I/O failures.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read a document
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write (replace) a document
    async fn write(&self, key: &str, content: &[u8]) -> Result<(), StorageError>;

    /// Delete a document; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
