//! CLI argument parsing, validation, and startup helpers.

use crate::auth::hash_password;
use crate::config::{
    AuthConfig, DEFAULT_ACCESS_TTL, DEFAULT_COOKIE_NAME, DEFAULT_COOKIE_PATH,
    DEFAULT_LOOKUP_TIMEOUT, DEFAULT_REFRESH_TTL,
};
use crate::db::{Database, NewUser};
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "reelauth",
    about = "Token authentication service with cookie-based session refresh"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "4000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "reelauth.db")]
    pub database: String,

    /// Issuer identity written into and required from access tokens
    #[arg(long, env = "JWT_ISSUER", default_value = "reelauth.local")]
    pub issuer: String,

    /// Audience identity written into access tokens
    #[arg(long, env = "JWT_AUDIENCE", default_value = "reelauth.local")]
    pub audience: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_ACCESS_TTL.as_secs())]
    pub access_ttl: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_REFRESH_TTL.as_secs())]
    pub refresh_ttl: u64,

    /// Name of the refresh session cookie
    #[arg(long, default_value = DEFAULT_COOKIE_NAME)]
    pub cookie_name: String,

    /// Path attribute of the refresh session cookie
    #[arg(long, default_value = DEFAULT_COOKIE_PATH)]
    pub cookie_path: String,

    /// Domain attribute of the refresh session cookie (not allowed with a __Host- name)
    #[arg(long)]
    pub cookie_domain: Option<String>,

    /// Timeout for a single user lookup, in milliseconds
    #[arg(long, default_value_t = DEFAULT_LOOKUP_TIMEOUT.as_millis() as u64)]
    pub lookup_timeout_ms: u64,

    /// Make refresh tokens single-use and revoke them on logout
    #[arg(long)]
    pub single_use_refresh: bool,

    /// Create a user with this email on startup (password from NEW_USER_PASSWORD)
    #[arg(long, requires_all = ["first_name", "last_name"])]
    pub create_user: Option<String>,

    /// First name of the user created with --create-user
    #[arg(long)]
    pub first_name: Option<String>,

    /// Last name of the user created with --create-user
    #[arg(long)]
    pub last_name: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
/// Length is checked later by `AuthConfig::validate`.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        return Some(secret);
    }

    let Some(path) = jwt_secret_file else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Some(content.trim().to_string()),
        Err(e) => {
            error!(path = %path, error = %e, "Failed to read JWT secret file");
            None
        }
    }
}

/// Build and validate the auth configuration from arguments.
/// Returns None and logs an error if validation fails.
pub fn build_auth_config(args: &Args, jwt_secret: String) -> Option<AuthConfig> {
    let mut config = AuthConfig::new(
        args.issuer.as_str(),
        args.audience.as_str(),
        jwt_secret.into_bytes(),
    );
    config.access_ttl = Duration::from_secs(args.access_ttl);
    config.refresh_ttl = Duration::from_secs(args.refresh_ttl);
    config.cookie_name = args.cookie_name.clone();
    config.cookie_path = args.cookie_path.clone();
    config.cookie_domain = args.cookie_domain.clone();
    config.lookup_timeout = Duration::from_millis(args.lookup_timeout_ms);

    match config.validate() {
        Ok(config) => {
            info!(config = ?config, "Auth configuration loaded");
            Some(config)
        }
        Err(e) => {
            error!(error = %e, "Invalid auth configuration");
            None
        }
    }
}

/// Handle the --create-user flag. Exits the process on failure.
pub async fn handle_create_user(db: &Database, email: &str, first_name: &str, last_name: &str) {
    let Ok(password) = std::env::var("NEW_USER_PASSWORD") else {
        error!("NEW_USER_PASSWORD is required with --create-user");
        std::process::exit(1);
    };
    // SAFETY: We're single-threaded at this point during startup.
    unsafe { std::env::remove_var("NEW_USER_PASSWORD") };

    if password.is_empty() {
        error!("NEW_USER_PASSWORD must not be empty");
        std::process::exit(1);
    }

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            std::process::exit(1);
        }
    };

    let user = NewUser {
        email,
        first_name,
        last_name,
        password_hash: &password_hash,
    };

    match db.users().create(&user).await {
        Ok(id) => info!(user_id = id, email = %email, "User created"),
        Err(e) => {
            error!(error = %e, email = %email, "Failed to create user");
            std::process::exit(1);
        }
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
