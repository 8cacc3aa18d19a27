//! File system storage backend
//!
//! Implements StorageBackend for native file system operations.
//! Each key is stored as one file directly under the base directory.
//!
//! ## Security
//!
//! Keys are validated to prevent path traversal: keys containing path
//! separators or ".." are rejected, so every resolved path stays within the
//! base directory.

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File system storage backend
pub struct FileSystemStorageBackend {
    base_path: PathBuf,
}

impl FileSystemStorageBackend {
    /// Create a new file system storage backend
    ///
    /// # Arguments
    ///
    /// * `base_path` - Directory holding one file per stored document
    ///
    /// # Example
    ///
    /// ```rust
    /// use form_builder_sdk::storage::filesystem::FileSystemStorageBackend;
    ///
    /// let backend = FileSystemStorageBackend::new("/var/lib/forms");
    /// ```
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Resolve a key to a file path with security checks.
    fn resolve_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::PermissionDenied(
                "Storage key cannot be empty".to_string(),
            ));
        }

        if key.contains("..") || key.contains('/') || key.contains('\\') {
            return Err(StorageError::PermissionDenied(format!(
                "Storage key '{}' may not contain path components",
                key
            )));
        }

        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl StorageBackend for FileSystemStorageBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let full_path = self.resolve_path(key)?;

        match fs::read(&full_path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to read {}: {}",
                full_path.display(),
                e
            ))),
        }
    }

    async fn write(&self, key: &str, content: &[u8]) -> Result<(), StorageError> {
        let full_path = self.resolve_path(key)?;

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::IoError(format!(
                "Failed to create directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        // Write to a sibling file first so a reader never sees a partial document
        let tmp_path = full_path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await.map_err(|e| {
            StorageError::IoError(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &full_path).await.map_err(|e| {
            StorageError::IoError(format!("Failed to replace {}: {}", full_path.display(), e))
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let full_path = self.resolve_path(key)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(format!(
                "Failed to delete {}: {}",
                full_path.display(),
                e
            ))),
        }
    }
}
