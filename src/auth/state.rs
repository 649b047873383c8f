//! Authentication state shared by handlers and extractors.

use std::sync::Arc;

use super::cookie::SessionCookies;
use super::extractors::AccessVerifier;
use super::issuer::TokenIssuer;
use super::store::{PrincipalStore, RevocationList};
use crate::config::AuthConfig;
use crate::jwt::TokenCodec;

/// Every auth component, wired from one immutable configuration.
#[derive(Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
    codec: TokenCodec,
    issuer: TokenIssuer,
    verifier: AccessVerifier,
    cookies: SessionCookies,
    store: Arc<dyn PrincipalStore>,
    revocation: Option<Arc<dyn RevocationList>>,
}

impl AuthState {
    pub fn new(config: Arc<AuthConfig>, store: Arc<dyn PrincipalStore>) -> Self {
        let codec = TokenCodec::new(&config.secret);
        Self {
            issuer: TokenIssuer::new(config.clone(), codec.clone()),
            verifier: AccessVerifier::new(config.clone(), codec.clone()),
            cookies: SessionCookies::new(config.clone()),
            config,
            codec,
            store,
            revocation: None,
        }
    }

    /// Enable single-use refresh tokens backed by `list`.
    pub fn with_revocation(mut self, list: Arc<dyn RevocationList>) -> Self {
        self.issuer = self.issuer.with_token_ids();
        self.revocation = Some(list);
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn verifier(&self) -> &AccessVerifier {
        &self.verifier
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    pub fn store(&self) -> &dyn PrincipalStore {
        self.store.as_ref()
    }

    pub fn revocation(&self) -> Option<&dyn RevocationList> {
        self.revocation.as_deref()
    }
}

/// Trait for router states that carry the authentication backend.
pub trait HasAuthBackend {
    fn auth(&self) -> &AuthState;
}

impl HasAuthBackend for AuthState {
    fn auth(&self) -> &AuthState {
        self
    }
}

impl HasAuthBackend for Arc<AuthState> {
    fn auth(&self) -> &AuthState {
        self
    }
}
