//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::Result;
use skydrive_core::Config;
use std::sync::Arc;

/// Connect the database, build storage and services, and assemble the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    tracing::info!(
        environment = %config.environment(),
        preview_mode = ?config.preview_mode(),
        "Configuration loaded"
    );

    crate::error::set_expose_error_details(!config.is_production());

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    let state = services::initialize_services(&config, pool, storage)?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
