//! Service and repository wiring

use crate::auth::JwtKeys;
use crate::state::{AppState, DbState, UploadState};
use anyhow::{Context, Result};
use skydrive_core::Config;
use skydrive_db::SessionRepository;
use skydrive_processing::{placeholder_preview, PreviewGenerator, UploadValidator};
use skydrive_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let db = DbState::new(pool);
    spawn_session_cleanup(db.sessions.clone());

    let placeholder = placeholder_preview(config.preview_size())
        .context("Failed to render placeholder preview")?;

    let upload = UploadState {
        storage,
        validator: UploadValidator::new(
            config.max_upload_bytes(),
            config.allowed_extensions().to_vec(),
        ),
        previews: build_preview_generator(config),
        placeholder: placeholder.into(),
    };

    Ok(Arc::new(AppState {
        config: config.clone(),
        db,
        upload,
        jwt: JwtKeys::new(config.jwt_secret()),
    }))
}

#[cfg(feature = "pdf")]
fn build_preview_generator(config: &Config) -> PreviewGenerator {
    let generator = PreviewGenerator::new(config.preview_size());
    match skydrive_processing::PdfiumRasterizer::bind(config.pdfium_library_path()) {
        Ok(rasterizer) => {
            tracing::info!(size = config.preview_size(), "PDF previews enabled");
            generator.with_rasterizer(Arc::new(rasterizer))
        }
        Err(e) => {
            tracing::warn!(error = %e, "pdfium not available, PDF previews will fail");
            generator
        }
    }
}

#[cfg(not(feature = "pdf"))]
fn build_preview_generator(config: &Config) -> PreviewGenerator {
    tracing::warn!("Built without the pdf feature, PDF previews will fail");
    PreviewGenerator::new(config.preview_size())
}

/// Periodically drop sessions past their expiry.
fn spawn_session_cleanup(sessions: SessionRepository) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match sessions.delete_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Removed expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
            }
        }
    });
}
