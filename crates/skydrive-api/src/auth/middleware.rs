use crate::auth::jwt::JwtKeys;
use crate::auth::models::AuthUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use skydrive_core::AppError;
use skydrive_db::{SessionRepository, UserRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtKeys,
    pub sessions: SessionRepository,
    pub users: UserRepository,
}

/// Require a valid bearer token backed by a live session.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token.to_string(),
        Err(e) => return HttpAppError(e).into_response(),
    };

    match authenticate(&auth_state, &token).await {
        Ok(user) => {
            tracing::debug!(user.id = %user.user_id, session.id = %user.session_id, "Authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        )),
    }
}

async fn authenticate(auth_state: &AuthState, token: &str) -> Result<AuthUser, AppError> {
    let claims = auth_state.jwt.verify(token)?;

    let session = auth_state
        .sessions
        .find_active(claims.sid, claims.sub)
        .await?
        .filter(|session| !session.is_expired(Utc::now()))
        .ok_or_else(|| AppError::Unauthorized("Session has ended".to_string()))?;

    let user = auth_state
        .users
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(AuthUser {
        user_id: user.id,
        session_id: session.id,
        email: user.email,
    })
}
