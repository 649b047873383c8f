//! Service status endpoint.

use axum::{Json, Router, routing::get};
use serde::Serialize;

/// Version embedded at compile time from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
struct StatusResponse {
    name: &'static str,
    version: &'static str,
}

pub fn router() -> Router {
    Router::new().route("/", get(get_status))
}

async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        name: env!("CARGO_PKG_NAME"),
        version: VERSION,
    })
}
