use crate::keys::validate_object_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{
    Attribute, AttributeValue, Attributes, Error as ObjectStoreError, ObjectStoreExt,
    PutOptions, PutPayload,
};
use std::time::Instant;

/// S3-compatible object storage (AWS S3, Cloudflare R2, MinIO)
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    /// Prefix object URLs are built from, without a trailing slash
    url_base: String,
}

/// Connection settings for [`S3Storage`]
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3Settings {
    /// Path-style `{endpoint}/{bucket}` for custom endpoints, virtual-hosted AWS otherwise.
    fn url_base(&self) -> String {
        match self.endpoint_url.as_deref() {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

impl S3Storage {
    /// Credentials not given explicitly fall back to the `AWS_*` environment variables.
    pub fn new(settings: S3Settings) -> StorageResult<Self> {
        let url_base = settings.url_base();

        let mut builder = AmazonS3Builder::from_env()
            .with_region(&settings.region)
            .with_bucket_name(&settings.bucket);

        if let (Some(key_id), Some(secret)) =
            (&settings.access_key_id, &settings.secret_access_key)
        {
            builder = builder
                .with_access_key_id(key_id)
                .with_secret_access_key(secret);
        }

        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket: settings.bucket,
            url_base,
        })
    }

    fn location(storage_key: &str) -> StorageResult<Path> {
        validate_object_key(storage_key)?;
        Ok(Path::from(storage_key))
    }

    fn object_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.url_base, storage_key)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        let location = Self::location(storage_key)?;
        let size = data.len();
        let start = Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let payload = PutPayload::from(data);
        object_store::ObjectStore::put_opts(&self.store, &location, payload, options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, key = %storage_key, "S3 upload failed");
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_millis() as u64,
            "S3 upload successful"
        );

        Ok(self.object_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let location = Self::location(storage_key)?;

        let object = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;
        let bytes = object
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    /// Deleting a missing object succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let location = Self::location(storage_key)?;

        match self.store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {
                tracing::info!(bucket = %self.bucket, key = %storage_key, "S3 object deleted");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, bucket = %self.bucket, key = %storage_key, "S3 delete failed");
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = Self::location(storage_key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(endpoint: Option<&str>) -> S3Settings {
        S3Settings {
            bucket: "skydrive".to_string(),
            region: "auto".to_string(),
            endpoint_url: endpoint.map(String::from),
            access_key_id: Some("test-key".to_string()),
            secret_access_key: Some("test-secret".to_string()),
        }
    }

    #[test]
    fn test_url_with_custom_endpoint() {
        let storage = S3Storage::new(settings(Some("http://localhost:9000/"))).unwrap();
        assert_eq!(
            storage.object_url("abc"),
            "http://localhost:9000/skydrive/abc"
        );
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }

    #[test]
    fn test_url_without_endpoint() {
        let s = S3Settings {
            region: "eu-west-1".to_string(),
            ..settings(None)
        };
        let storage = S3Storage::new(s).unwrap();
        assert_eq!(
            storage.object_url("abc"),
            "https://skydrive.s3.eu-west-1.amazonaws.com/abc"
        );
    }

    #[tokio::test]
    async fn test_invalid_key_never_reaches_the_store() {
        let storage = S3Storage::new(settings(Some("http://127.0.0.1:1"))).unwrap();
        assert!(matches!(
            storage.exists("../secret").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
