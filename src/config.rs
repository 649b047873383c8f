//! Authentication configuration.
//!
//! Built once at startup, validated, then shared read-only (`Arc<AuthConfig>`)
//! with every component that needs it.

use std::fmt;
use std::time::Duration;

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Access token lifetime: 15 minutes
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Refresh token lifetime: 24 hours
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub const DEFAULT_COOKIE_NAME: &str = "__Host-refresh_token";
pub const DEFAULT_COOKIE_PATH: &str = "/";

/// Longest accepted access or refresh token lifetime: 365 days
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Upper bound for a single user-store lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

const HOST_COOKIE_PREFIX: &str = "__Host-";

#[derive(Clone)]
pub struct AuthConfig {
    /// Issuer identity written into, and required from, access tokens
    pub issuer: String,
    /// Audience identity written into access tokens
    pub audience: String,
    /// HMAC signing secret
    pub secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Name of the refresh session cookie
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    /// Timeout applied to each principal lookup
    pub lookup_timeout: Duration,
}

impl AuthConfig {
    /// Create a configuration with default lifetimes and cookie settings.
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        secret: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            secret: secret.into(),
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_path: DEFAULT_COOKIE_PATH.to_string(),
            cookie_domain: None,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Check the configuration is usable. Any error here is fatal at startup.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::ShortSecret);
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::Empty("issuer"));
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::Empty("audience"));
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ConfigError::Empty("cookie name"));
        }
        if !self.cookie_path.starts_with('/') {
            return Err(ConfigError::InvalidCookiePath(self.cookie_path));
        }
        if self.access_ttl.as_secs() == 0 {
            return Err(ConfigError::ZeroDuration("access token lifetime"));
        }
        if self.refresh_ttl.as_secs() == 0 {
            return Err(ConfigError::ZeroDuration("refresh token lifetime"));
        }
        if self.access_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::TtlTooLong("access token lifetime"));
        }
        if self.refresh_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::TtlTooLong("refresh token lifetime"));
        }
        if self.lookup_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("lookup timeout"));
        }

        // Browsers drop __Host- cookies that carry a Domain or a non-root Path.
        if self.cookie_name.starts_with(HOST_COOKIE_PREFIX)
            && (self.cookie_domain.is_some() || self.cookie_path != "/")
        {
            return Err(ConfigError::HostPrefixScope(self.cookie_name));
        }

        Ok(self)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_path", &self.cookie_path)
            .field("cookie_domain", &self.cookie_domain)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("signing secret must be at least {min} bytes", min = MIN_SECRET_LENGTH)]
    ShortSecret,
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("{0} must not exceed {max} seconds", max = MAX_TOKEN_TTL.as_secs())]
    TtlTooLong(&'static str),
    #[error("cookie path must start with '/': {0}")]
    InvalidCookiePath(String),
    #[error("cookie {0} uses the __Host- prefix and must have path '/' and no domain")]
    HostPrefixScope(String),
}
