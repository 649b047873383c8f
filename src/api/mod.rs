mod account;
mod session;
mod status;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;

use crate::auth::AuthState;

/// Create the API router.
pub fn create_api_router(auth: Arc<AuthState>) -> Router {
    let protected = account::router(auth.clone()).layer(middleware::from_fn(vary_on_authorization));

    Router::new()
        .merge(status::router())
        .merge(session::router(auth))
        .merge(protected)
}

/// Mark responses as depending on the `Authorization` request header,
/// rejections included.
async fn vary_on_authorization(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}
