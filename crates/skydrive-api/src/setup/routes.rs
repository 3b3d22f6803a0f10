//! Route configuration and setup

use crate::auth::middleware::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, patch, post},
    Json, Router,
};
use skydrive_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and headers around the largest accepted file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = AuthState {
        jwt: state.jwt.clone(),
        sessions: state.db.sessions.clone(),
        users: state.db.users.clone(),
    };

    let protected_routes = protected_routes(config.api_prefix()).layer(
        axum::middleware::from_fn_with_state(Arc::new(auth_state), auth_middleware),
    );

    let body_limit = config.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES;
    let openapi = crate::api_doc::get_openapi_spec(config.api_prefix());

    let app = public_routes(config.api_prefix())
        .merge(protected_routes)
        .route("/api/openapi.json", get(move || async move { Json(openapi) }))
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS_ORIGINS entry: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes (no authentication required)
fn public_routes(prefix: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::auth::root))
        .route("/health", get(handlers::health::health_check))
        .route("/live", get(handlers::health::liveness_check))
        .route(&format!("{}/auth/signup", prefix), post(handlers::auth::signup))
        .route(&format!("{}/auth/login", prefix), post(handlers::auth::login))
}

/// Protected routes (require authentication)
fn protected_routes(prefix: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(&format!("{}/auth/logout", prefix), post(handlers::auth::logout))
        .route(&format!("{}/protected", prefix), get(handlers::auth::protected))
        .route(&format!("{}/files", prefix), post(handlers::files::list_files))
        .route(
            &format!("{}/files/upload", prefix),
            post(handlers::files::upload_file),
        )
        .route(
            &format!("{}/files/search", prefix),
            post(handlers::files::search_files),
        )
        .route(
            &format!("{}/files/{{id}}/preview", prefix),
            get(handlers::files::get_file_preview),
        )
        .route(
            &format!("{}/files/{{id}}/share", prefix),
            patch(handlers::files::share_file),
        )
        .route(
            &format!("{}/files/{{id}}", prefix),
            delete(handlers::files::delete_file),
        )
}
