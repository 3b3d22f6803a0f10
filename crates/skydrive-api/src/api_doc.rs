//! OpenAPI documentation.
//!
//! Handler annotations use the default `/api/v1` prefix; the served document
//! is rewritten to the configured `API_V1_PREFIX`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use skydrive_core::models;

/// Prefix baked into handler path annotations (utoipa requires literals).
const OPENAPI_PATH_PLACEHOLDER: &str = "/api/v1";

fn transform_openapi_paths(spec: &mut utoipa::openapi::OpenApi, prefix: &str) {
    if OPENAPI_PATH_PLACEHOLDER == prefix {
        return;
    }
    let path_map = std::mem::take(&mut spec.paths.paths);
    for (key, item) in path_map {
        let new_key = key.replacen(OPENAPI_PATH_PLACEHOLDER, prefix, 1);
        spec.paths.paths.insert(new_key, item);
    }
}

/// OpenAPI document with paths under `api_prefix`.
pub fn get_openapi_spec(api_prefix: &str) -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    transform_openapi_paths(&mut spec, api_prefix);
    spec
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SkyDrive API",
        version = "0.1.0",
        description = "File storage with square preview thumbnails and per-user sharing."
    ),
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::protected,
        handlers::files::list_files,
        handlers::files::upload_file,
        handlers::files::get_file_preview,
        handlers::files::share_file,
        handlers::files::delete_file,
        handlers::files::search_files,
    ),
    components(
        schemas(
            models::SignupRequest,
            models::SignupResponse,
            models::LoginRequest,
            models::LoginResponse,
            models::FileFilter,
            models::ListFilesRequest,
            models::SearchFilesRequest,
            models::ShareFileRequest,
            models::FileSummary,
            models::FileListResponse,
            models::UploadFileResponse,
            models::FilePreviewResponse,
            models::PreviewStatus,
            models::MessageResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Accounts and login sessions"),
        (name = "files", description = "Upload, preview, share, search and delete files")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_configured_prefix() {
        let spec = get_openapi_spec("/v2");
        assert!(spec.paths.paths.contains_key("/v2/files/upload"));
        assert!(spec.paths.paths.contains_key("/v2/files/{id}/preview"));
        assert!(!spec.paths.paths.keys().any(|k| k.starts_with("/api/v1")));
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let spec = get_openapi_spec("/api/v1");
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
