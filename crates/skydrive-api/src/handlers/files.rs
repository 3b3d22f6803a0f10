//! File listing, upload, preview, sharing, deletion and search.

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::upload::{extract_multipart_file, store_file};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use skydrive_core::models::{
    FileFilter, FileListResponse, FilePreviewResponse, FileRecord, ListFilesRequest,
    MessageResponse, SearchFilesRequest, ShareFileRequest, UploadFileResponse,
};
use skydrive_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

async fn load_file(state: &AppState, file_id: Uuid) -> Result<FileRecord, AppError> {
    state
        .db
        .files
        .get(file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))
}

fn require_owner(file: &FileRecord, user: &AuthUser, action: &str) -> Result<(), AppError> {
    if file.owner != user.user_id {
        return Err(AppError::Forbidden(format!(
            "Only the owner can {} this file",
            action
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/files",
    tag = "files",
    request_body = ListFilesRequest,
    responses(
        (status = 200, description = "Files visible to the caller", body = FileListResponse),
        (status = 400, description = "Unknown filter", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user, request), fields(user.id = %user.user_id))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<ListFilesRequest>,
) -> Result<Json<FileListResponse>, HttpAppError> {
    let files = match request.filter {
        FileFilter::Private => state.db.files.list_owned(user.user_id).await?,
        FileFilter::Shared => state.db.files.list_shared_with(user.user_id).await?,
    };

    Ok(Json(FileListResponse {
        message: "Files retrieved successfully".to_string(),
        files,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/files/upload",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded", body = UploadFileResponse),
        (status = 400, description = "Missing file name, bad extension or empty file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user, multipart), fields(user.id = %user.user_id))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadFileResponse>), HttpAppError> {
    let incoming = extract_multipart_file(multipart).await?;
    state
        .upload
        .validator
        .validate_all(&incoming.filename, &incoming.data)?;

    let record = store_file(&state, user.user_id, incoming).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadFileResponse {
            message: "File uploaded successfully".to_string(),
            file_id: record.id,
            file_name: record.filename,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}/preview",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "File details and preview", body = FilePreviewResponse),
        (status = 403, description = "Caller cannot see this file", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user), fields(user.id = %user.user_id, file.id = %file_id))]
pub async fn get_file_preview(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<Uuid>,
) -> Result<Json<FilePreviewResponse>, HttpAppError> {
    let file = load_file(&state, file_id).await?;

    if !state.db.shares.has_access(file.id, user.user_id).await? {
        return Err(AppError::Forbidden("You do not have access to this file".to_string()).into());
    }

    let created_by = state
        .db
        .users
        .find_by_id(file.owner)
        .await?
        .map(|owner| owner.email)
        .unwrap_or_else(|| "unknown".to_string());
    let shared_with = state.db.shares.shared_emails(file.id).await?;

    Ok(Json(FilePreviewResponse {
        message: "File preview retrieved successfully".to_string(),
        file_id: file.id,
        file_name: file.filename,
        download_url: file.file_url,
        preview_image: file.preview_image,
        preview_status: file.preview_status,
        created_at: file.created_at,
        created_by,
        is_shared: file.is_shared,
        shared_with,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/files/{id}/share",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    request_body = ShareFileRequest,
    responses(
        (status = 200, description = "File shared", body = MessageResponse),
        (status = 400, description = "Sharing with yourself", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "File or recipient not found", body = ErrorResponse),
        (status = 409, description = "Already shared with this user", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user, request), fields(user.id = %user.user_id, file.id = %file_id))]
pub async fn share_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ShareFileRequest>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    let file = load_file(&state, file_id).await?;
    require_owner(&file, &user, "share")?;

    let recipient = state
        .db
        .users
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

    if recipient.id == user.user_id {
        return Err(AppError::BadRequest("You cannot share a file with yourself".to_string()).into());
    }

    if !state.db.shares.share(file.id, recipient.id).await? {
        return Err(AppError::Conflict("File is already shared with this user".to_string()).into());
    }

    tracing::info!(recipient.id = %recipient.id, "File shared");
    Ok(Json(MessageResponse::new("File shared successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user), fields(user.id = %user.user_id, file.id = %file_id))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(file_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    let file = load_file(&state, file_id).await?;
    require_owner(&file, &user, "delete")?;

    state.upload.storage.delete(&file.storage_key).await?;
    state.db.files.delete(file.id).await?;

    tracing::info!("File deleted");
    Ok(Json(MessageResponse::new("File deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/files/search",
    tag = "files",
    request_body = SearchFilesRequest,
    responses(
        (status = 200, description = "Matching files", body = FileListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user, request), fields(user.id = %user.user_id))]
pub async fn search_files(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<SearchFilesRequest>,
) -> Result<Json<FileListResponse>, HttpAppError> {
    let query = request.query.to_lowercase();
    let files = state.db.files.search(user.user_id, &query).await?;

    Ok(Json(FileListResponse {
        message: "Files retrieved successfully".to_string(),
        files,
    }))
}
