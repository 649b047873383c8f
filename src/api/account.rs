//! Account API endpoints (access token required).
//!
//! - GET `/me` - The authenticated principal

use axum::{Json, Router, routing::get};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{Auth, AuthState};

pub fn router(state: Arc<AuthState>) -> Router {
    Router::new().route("/me", get(me)).with_state(state)
}

#[derive(Serialize)]
struct MeResponse {
    id: i64,
    name: String,
}

async fn me(Auth(user): Auth) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.principal_id,
        name: user.display_name,
    })
}
