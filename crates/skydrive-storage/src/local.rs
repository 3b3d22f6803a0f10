//! Filesystem backend, used for development and the integration tests.
//!
//! Objects live directly under `base_path`, one file per key. Keys are
//! flat (see [`validate_object_key`]), so no subdirectories are created.

use crate::keys::validate_object_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create the storage root if needed.
    ///
    /// `base_url` is the prefix object URLs are built from, e.g.
    /// `http://localhost:3000/files`.
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;
        let root = fs::canonicalize(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to resolve storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_object_key(storage_key)?;
        Ok(self.root.join(storage_key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.object_path(storage_key)?;
        let size = data.len();

        // Readers never see a partially written object.
        let staging = self.root.join(format!(".{}.partial", storage_key));
        fs::write(&staging, &data)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("{}: {}", path.display(), e)))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(key = %storage_key, size_bytes = size, "Stored object on disk");
        Ok(format!("{}/{}", self.base_url, storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(storage_key)?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(storage_key.to_string()),
            _ => StorageError::DownloadFailed(format!("{}: {}", path.display(), e)),
        })
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.object_path(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %storage_key, "Removed object from disk");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.object_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
