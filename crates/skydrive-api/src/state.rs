//! Shared application state handed to every handler.

use crate::auth::JwtKeys;
use skydrive_core::Config;
use skydrive_db::{FileRepository, SessionRepository, ShareRepository, UserRepository};
use skydrive_processing::{PreviewGenerator, UploadValidator};
use skydrive_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Repositories over the shared pool
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub users: UserRepository,
    pub sessions: SessionRepository,
    pub files: FileRepository,
    pub shares: ShareRepository,
}

impl DbState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            files: FileRepository::new(pool.clone()),
            shares: ShareRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Everything an upload needs besides the request itself
#[derive(Clone)]
pub struct UploadState {
    pub storage: Arc<dyn Storage>,
    pub validator: UploadValidator,
    pub previews: PreviewGenerator,
    /// Base64 PNG stored while a preview is pending or after it failed
    pub placeholder: Arc<str>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DbState,
    pub upload: UploadState,
    pub jwt: JwtKeys,
}
