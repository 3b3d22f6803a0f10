use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle of the inline preview stored on a file row.
///
/// A row leaves `Pending` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "preview_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
    Pending,
    Ready,
    Failed,
}

/// Uploaded file row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileRecord {
    pub id: Uuid,
    pub filename: String,
    pub owner: Uuid,
    pub file_url: String,
    /// Object-store key; a random token unrelated to `id`.
    pub storage_key: String,
    pub preview_image: String,
    pub preview_status: PreviewStatus,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
}

/// Values needed to insert a new file row
#[derive(Debug, Clone)]
pub struct NewFile {
    pub id: Uuid,
    pub filename: String,
    pub owner: Uuid,
    pub file_url: String,
    pub storage_key: String,
    pub preview_image: String,
    pub preview_status: PreviewStatus,
}

/// Which side of the sharing relation to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileFilter {
    /// Files owned by the caller
    Private,
    /// Files other users shared with the caller
    Shared,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ListFilesRequest {
    pub filter: FileFilter,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SearchFilesRequest {
    #[validate(length(max = 255, message = "Search query is too long"))]
    pub query: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ShareFileRequest {
    #[validate(email(message = "A valid recipient email is required"))]
    pub email: String,
}

/// Grid entry returned by listing and search
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "id"))]
    pub file_id: Uuid,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "filename"))]
    pub file_name: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "preview_image"))]
    pub preview_image: String,
}

impl From<FileRecord> for FileSummary {
    fn from(file: FileRecord) -> Self {
        FileSummary {
            file_id: file.id,
            file_name: file.filename,
            preview_image: file.preview_image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileListResponse {
    pub message: String,
    pub files: Vec<FileSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponse {
    pub message: String,
    pub file_id: Uuid,
    pub file_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilePreviewResponse {
    pub message: String,
    pub file_id: Uuid,
    pub file_name: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    pub preview_image: String,
    pub preview_status: PreviewStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub is_shared: bool,
    pub shared_with: Vec<String>,
}

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
