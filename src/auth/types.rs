//! Authentication user types.

use axum_extra::extract::cookie::Cookie;
use serde::Serialize;

use crate::jwt::AccessClaims;

/// An authenticated subject as known to the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub display_name: String,
}

impl Principal {
    /// Build a principal whose display name is "first last".
    pub fn new(id: i64, first_name: &str, last_name: &str) -> Self {
        Self {
            id,
            display_name: format!("{} {}", first_name, last_name),
        }
    }
}

/// A principal together with its stored password hash.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub principal: Principal,
    pub password_hash: String,
}

/// Access and refresh token minted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Result of a login or refresh: the new pair and the cookie carrying it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub principal: Principal,
    pub pair: TokenPair,
    pub cookie: Cookie<'static>,
}

/// Authenticated user information extracted from an access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub principal_id: i64,
    pub display_name: String,
    /// JWT claims from the access token
    pub claims: AccessClaims,
}
