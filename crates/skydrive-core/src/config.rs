//! Configuration module
//!
//! Service configuration is read from environment variables (optionally
//! from a `.env` file) and validated once at startup.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SESSION_TTL_HOURS: i64 = 24;
const MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024;
const PREVIEW_SIZE: u32 = 256;
/// Largest accepted preview edge; previews are held in memory as RGBA.
const MAX_PREVIEW_SIZE: u32 = 4096;
const S3_BUCKET: &str = "skydrive";
const S3_REGION: &str = "auto";

/// When preview thumbnails are generated relative to the upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    /// Generate before the file row is inserted.
    Inline,
    /// Insert with a placeholder and fill the preview in from a background task.
    Deferred,
}

impl FromStr for PreviewMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(PreviewMode::Inline),
            "deferred" => Ok(PreviewMode::Deferred),
            _ => Err(anyhow::anyhow!("Invalid preview mode: {}", s)),
        }
    }
}

/// SkyDrive service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub environment: String,
    pub server_port: u16,
    pub api_prefix: String,
    pub project_name: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // S3-compatible providers (R2, MinIO, ...)
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub public_download_base_url: Option<String>,
    // Uploads and previews
    pub max_upload_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub preview_size: u32,
    pub preview_mode: PreviewMode,
    pub pdfium_library_path: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url =
            non_empty("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            non_empty("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };
        let preview_mode = match non_empty("PREVIEW_MODE") {
            Some(value) => value.parse()?,
            None => PreviewMode::Inline,
        };

        let config = ServiceConfig {
            environment: non_empty("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            server_port: non_empty("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SERVER_PORT),
            api_prefix: non_empty("API_V1_PREFIX")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "/api/v1".to_string()),
            project_name: non_empty("PROJECT_NAME").unwrap_or_else(|| "SkyDrive".to_string()),
            cors_origins: non_empty("CORS_ORIGINS")
                .map(|s| split_list(&s))
                .unwrap_or_default(),
            database_url,
            db_max_connections: non_empty("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: non_empty("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret,
            session_ttl_hours: non_empty("SESSION_TTL_HOURS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SESSION_TTL_HOURS),
            storage_backend,
            s3_bucket: non_empty("S3_BUCKET").unwrap_or_else(|| S3_BUCKET.to_string()),
            s3_region: non_empty("S3_REGION").unwrap_or_else(|| S3_REGION.to_string()),
            s3_endpoint: non_empty("S3_ENDPOINT_URL"),
            s3_access_key_id: non_empty("S3_ACCESS_KEY_ID"),
            s3_secret_access_key: non_empty("S3_SECRET_ACCESS_KEY"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            public_download_base_url: non_empty("PUBLIC_DOWNLOAD_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string()),
            max_upload_bytes: non_empty("MAX_UPLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_UPLOAD_BYTES),
            allowed_extensions: ["png", "jpg", "jpeg", "pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preview_size: non_empty("PREVIEW_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PREVIEW_SIZE),
            preview_mode,
            pdfium_library_path: non_empty("PDFIUM_LIBRARY_PATH"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !(self.database_url.starts_with("postgresql://")
            || self.database_url.starts_with("postgres://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.session_ttl_hours <= 0 {
            return Err(anyhow::anyhow!("SESSION_TTL_HOURS must be positive"));
        }

        if self.preview_size == 0 || self.preview_size > MAX_PREVIEW_SIZE {
            return Err(anyhow::anyhow!(
                "PREVIEW_SIZE must be between 1 and {}",
                MAX_PREVIEW_SIZE
            ));
        }

        if is_production(&self.environment) && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS must not contain '*' in production"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_access_key_id.is_some() != self.s3_secret_access_key.is_some() {
                    return Err(anyhow::anyhow!(
                        "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_production(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config(Box::new(ServiceConfig::from_source(lookup)?)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production(&self.inner().environment)
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn api_prefix(&self) -> &str {
        &self.inner().api_prefix
    }

    pub fn project_name(&self) -> &str {
        &self.inner().project_name
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().jwt_secret
    }

    pub fn session_ttl_hours(&self) -> i64 {
        self.inner().session_ttl_hours
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> &str {
        &self.inner().s3_bucket
    }

    pub fn s3_region(&self) -> &str {
        &self.inner().s3_region
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn s3_access_key_id(&self) -> Option<&str> {
        self.inner().s3_access_key_id.as_deref()
    }

    pub fn s3_secret_access_key(&self) -> Option<&str> {
        self.inner().s3_secret_access_key.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn public_download_base_url(&self) -> Option<&str> {
        self.inner().public_download_base_url.as_deref()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.inner().max_upload_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().allowed_extensions
    }

    pub fn preview_size(&self) -> u32 {
        self.inner().preview_size
    }

    pub fn preview_mode(&self) -> PreviewMode {
        self.inner().preview_mode
    }

    pub fn pdfium_library_path(&self) -> Option<&str> {
        self.inner().pdfium_library_path.as_deref()
    }
}
