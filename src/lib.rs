pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod db;
pub mod jwt;

use api::create_api_router;
use auth::AuthState;
use axum::Router;
use config::AuthConfig;
use db::Database;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Validated authentication settings
    pub auth: AuthConfig,
    /// Whether refresh tokens are single-use (tracked in the database)
    pub single_use_refresh: bool,
}

/// Build the authentication state for the given configuration.
pub fn create_auth_state(config: &ServerConfig) -> AuthState {
    let db = Arc::new(config.db.clone());
    let state = AuthState::new(Arc::new(config.auth.clone()), db.clone());
    if config.single_use_refresh {
        state.with_revocation(db)
    } else {
        state
    }
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let auth = Arc::new(create_auth_state(config));
    Router::new().nest("/api", create_api_router(auth))
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}
