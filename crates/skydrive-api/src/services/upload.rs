//! Upload orchestration: validate, preview, store the blob, insert the row.

use crate::state::AppState;
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use skydrive_core::models::{FileRecord, NewFile, PreviewStatus};
use skydrive_core::{AppError, PreviewMode};
use skydrive_processing::{generate_preview_blocking, sanitize_filename};
use skydrive_storage::generate_object_key;
use uuid::Uuid;

/// A file read from a multipart body
#[derive(Debug)]
pub struct IncomingFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Read the single `file` field of a multipart form.
pub async fn extract_multipart_file(mut multipart: Multipart) -> Result<IncomingFile, AppError> {
    let mut incoming: Option<IncomingFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        if incoming.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let filename = field
            .file_name()
            .map(sanitize_filename)
            .ok_or_else(|| AppError::BadRequest("File name is required".to_string()))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        incoming = Some(IncomingFile {
            filename,
            content_type,
            data,
        });
    }

    incoming.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// Store an already validated file for `owner` and return the inserted row.
#[tracing::instrument(skip(state, file), fields(user.id = %owner, file.name = %file.filename, file.size = file.data.len()))]
pub async fn store_file(
    state: &AppState,
    owner: Uuid,
    file: IncomingFile,
) -> Result<FileRecord, AppError> {
    let upload = &state.upload;
    let mode = state.config.preview_mode();

    let (preview_image, preview_status) = match mode {
        PreviewMode::Inline => {
            match generate_preview_blocking(
                upload.previews.clone(),
                file.data.clone(),
                file.filename.clone(),
            )
            .await
            {
                Ok(image) => (image, PreviewStatus::Ready),
                Err(e) => {
                    tracing::warn!(error = %e, "Preview generation failed, storing placeholder");
                    (upload.placeholder.to_string(), PreviewStatus::Failed)
                }
            }
        }
        PreviewMode::Deferred => (upload.placeholder.to_string(), PreviewStatus::Pending),
    };

    let storage_key = generate_object_key();
    let storage_url = upload
        .storage
        .upload_with_key(&storage_key, file.data.clone(), &file.content_type)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let file_url = match state.config.public_download_base_url() {
        Some(base) => format!("{}/{}", base, storage_key),
        None => storage_url,
    };

    let new_file = NewFile {
        id: Uuid::new_v4(),
        filename: file.filename.clone(),
        owner,
        file_url,
        storage_key: storage_key.clone(),
        preview_image,
        preview_status,
    };

    let record = match state.db.files.create(&new_file).await {
        Ok(record) => record,
        Err(e) => {
            // The row never existed, so nothing else references the blob.
            if let Err(cleanup_err) = upload.storage.delete(&storage_key).await {
                tracing::warn!(
                    error = %cleanup_err,
                    storage_key = %storage_key,
                    "Failed to clean up stored blob after database error"
                );
            }
            return Err(e);
        }
    };

    if mode == PreviewMode::Deferred {
        spawn_deferred_preview(state, record.id, file.data, file.filename);
    }

    tracing::info!(file.id = %record.id, preview_status = ?record.preview_status, "File uploaded");
    Ok(record)
}

/// Generate the preview off the request task and settle the row once.
fn spawn_deferred_preview(state: &AppState, file_id: Uuid, data: Bytes, filename: String) {
    let generator = state.upload.previews.clone();
    let placeholder = state.upload.placeholder.clone();
    let files = state.db.files.clone();

    tokio::spawn(async move {
        let (image, status) = match generate_preview_blocking(generator, data, filename).await {
            Ok(image) => (image, PreviewStatus::Ready),
            Err(e) => {
                tracing::warn!(file.id = %file_id, error = %e, "Deferred preview generation failed");
                (placeholder.to_string(), PreviewStatus::Failed)
            }
        };

        match files.set_preview(file_id, &image, status).await {
            Ok(true) => tracing::debug!(file.id = %file_id, ?status, "Preview settled"),
            Ok(false) => {
                tracing::debug!(file.id = %file_id, "Preview already settled or file deleted")
            }
            Err(e) => tracing::error!(file.id = %file_id, error = %e, "Failed to store preview"),
        }
    });
}
