//! Access token verification and the axum extractor built on it.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::debug;

use super::errors::AuthError;
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;
use crate::config::AuthConfig;
use crate::jwt::{TokenCodec, TokenError, unix_now};

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Anything other than exactly one space-separated scheme and token is
/// rejected, including repeated or trailing whitespace.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    let (scheme, token) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || scheme != "Bearer" || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Authenticates requests carrying an access token.
#[derive(Clone)]
pub struct AccessVerifier {
    config: Arc<AuthConfig>,
    codec: TokenCodec,
}

impl AccessVerifier {
    pub fn new(config: Arc<AuthConfig>, codec: TokenCodec) -> Self {
        Self { config, codec }
    }

    /// Verify the bearer token in `headers` as of `now` (Unix seconds).
    pub fn authenticate(
        &self,
        headers: &HeaderMap,
        now: u64,
    ) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingOrMalformedHeader)?;

        let claims = self
            .codec
            .verify_access(token, now)
            .map_err(|e| match e {
                TokenError::Expired => AuthError::ExpiredToken,
                other => {
                    debug!(error = %other, "Rejected access token");
                    AuthError::InvalidToken
                }
            })?;

        if claims.iss != self.config.issuer {
            debug!(issuer = %claims.iss, "Rejected access token from untrusted issuer");
            return Err(AuthError::UntrustedIssuer);
        }

        let principal_id = claims.sub.parse::<i64>().map_err(|_| {
            debug!("Rejected access token with non-numeric subject");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser {
            principal_id,
            display_name: claims.name.clone(),
            claims,
        })
    }
}

/// Extractor for endpoints that require a valid access token.
/// Rejections render as JSON errors; no cookies are touched.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let now = unix_now().map_err(|e| AuthError::internal("Failed to read clock", e))?;
        state
            .auth()
            .verifier()
            .authenticate(&parts.headers, now)
            .map(Auth)
    }
}
