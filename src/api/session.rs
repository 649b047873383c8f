//! Session API endpoints.
//!
//! - POST `/authenticate` - Exchange email and password for a token pair
//! - GET|POST `/refresh` - Exchange the refresh cookie for a new token pair
//! - GET|POST `/logout` - Clear the refresh cookie

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::{AuthError, AuthState, IssuedSession};
use crate::jwt::unix_now;

pub fn router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/authenticate", post(authenticate))
        .route("/refresh", get(refresh).post(refresh))
        .route("/logout", get(logout).post(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct AuthenticateRequest {
    email: String,
    password: String,
}

fn now() -> Result<u64, AuthError> {
    unix_now().map_err(|e| AuthError::internal("Failed to read clock", e))
}

fn session_response(session: IssuedSession) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(SET_COOKIE, session.cookie.to_string())],
        Json(session.pair),
    )
}

async fn authenticate(
    State(state): State<Arc<AuthState>>,
    Json(request): Json<AuthenticateRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let session = state
        .login(&request.email, &request.password, now()?)
        .await?;

    info!(principal_id = session.principal.id, "User authenticated");
    Ok(session_response(session))
}

async fn refresh(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let session = state.refresh_session(&headers, now()?).await?;
    Ok(session_response(session))
}

/// Always succeeds, whatever state the session cookie is in.
async fn logout(State(state): State<Arc<AuthState>>, headers: HeaderMap) -> impl IntoResponse {
    let cookie = state.end_session(&headers, unix_now().ok()).await;
    (StatusCode::ACCEPTED, [(SET_COOKIE, cookie.to_string())])
}
