//! Account, session and example routes.

use crate::auth::password::{hash_password, verify_password};
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use skydrive_core::models::{
    LoginRequest, LoginResponse, MessageResponse, SignupRequest, SignupResponse,
};
use skydrive_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), HttpAppError> {
    let password_hash = hash_password(&request.password)?;
    let user = state.db.users.create(&request.email, &password_hash).await?;

    tracing::info!(user.id = %user.id, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user_id: user.id,
            email: user.email,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpAppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .db
        .users
        .find_by_email(&request.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(invalid().into());
    }

    let issued_at = Utc::now();
    let expires_at = issued_at + Duration::hours(state.config.session_ttl_hours());
    let session = state.db.sessions.create(user.id, expires_at).await?;
    let access_token = state
        .jwt
        .issue(user.id, session.id, issued_at, session.expires_at)?;

    tracing::info!(user.id = %user.id, session.id = %session.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_at: session.expires_at,
        user_id: user.id,
        email: user.email,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session ended", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, user), fields(user.id = %user.user_id))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state
        .db
        .sessions
        .delete(user.session_id, user.user_id)
        .await?;

    Ok(Json(MessageResponse::new("Successfully logged out")))
}

#[utoipa::path(
    get,
    path = "/api/v1/protected",
    tag = "auth",
    responses(
        (status = 200, description = "Caller is authenticated"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn protected(user: AuthUser) -> Json<Value> {
    Json(json!({
        "message": "This is a protected route",
        "user": {
            "userId": user.user_id,
            "email": user.email,
        }
    }))
}

pub async fn root(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    Json(MessageResponse::new(format!(
        "Welcome to {}",
        state.config.project_name()
    )))
}
