//! Login, session refresh and logout.
//!
//! Refresh walks `AwaitingCookie -> CookiePresent -> ClaimsValid ->
//! UserResolved -> Reissued`. Every failure is terminal and the client only
//! ever sees the coarse `AuthError`; the failing stage is logged at debug.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::Cookie;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use super::cookie::get_cookie;
use super::errors::AuthError;
use super::password::{DECOY_HASH, verify_password};
use super::state::AuthState;
use super::types::{IssuedSession, Principal};

#[derive(Debug, Clone, Copy)]
enum Stage {
    AwaitingCookie,
    CookiePresent,
    ClaimsValid,
    UserResolved,
}

fn reject(stage: Stage, reason: &str, err: AuthError) -> AuthError {
    debug!(stage = ?stage, reason, "Session refresh rejected");
    err
}

impl AuthState {
    /// Verify `identifier`/`password` and issue a session.
    ///
    /// Unknown identifiers, wrong passwords and store failures are
    /// indistinguishable to the caller.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        now: u64,
    ) -> Result<IssuedSession, AuthError> {
        let lookup = timeout(
            self.config().lookup_timeout,
            self.store().lookup_by_credential(identifier),
        )
        .await;

        // Misses still pay for a full Argon2 check against the decoy hash
        let (principal, hash) = match lookup {
            Ok(Ok(Some(record))) => (Some(record.principal), record.password_hash),
            Ok(Ok(None)) => {
                debug!("Login attempt for unknown identifier");
                (None, DECOY_HASH.to_owned())
            }
            Ok(Err(e)) => {
                error!(error = %e, "Credential lookup failed");
                (None, DECOY_HASH.to_owned())
            }
            Err(_) => {
                warn!("Credential lookup timed out");
                (None, DECOY_HASH.to_owned())
            }
        };

        // Argon2 is CPU-bound
        let password = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::internal("Password verification task failed", e))?;

        match principal {
            Some(principal) if matches => self.issue(principal, now),
            Some(principal) => {
                debug!(principal_id = principal.id, "Password mismatch");
                Err(AuthError::CredentialMismatch)
            }
            None => Err(AuthError::CredentialMismatch),
        }
    }

    /// Exchange the refresh cookie in `headers` for a new session.
    pub async fn refresh_session(
        &self,
        headers: &HeaderMap,
        now: u64,
    ) -> Result<IssuedSession, AuthError> {
        let token = get_cookie(headers, self.cookies().name()).ok_or_else(|| {
            reject(Stage::AwaitingCookie, "no session cookie", AuthError::NoSession)
        })?;

        let claims = self.codec().verify_refresh(token, now).map_err(|e| {
            debug!(error = %e, "Refresh token verification failed");
            reject(Stage::CookiePresent, "invalid refresh token", AuthError::Unauthorized)
        })?;

        if let Some(revocation) = self.revocation() {
            let Some(jti) = claims.jti.as_deref() else {
                return Err(reject(
                    Stage::ClaimsValid,
                    "missing token id",
                    AuthError::Unauthorized,
                ));
            };
            match revocation.is_revoked(jti).await {
                Ok(false) => {}
                Ok(true) => {
                    return Err(reject(
                        Stage::ClaimsValid,
                        "revoked token id",
                        AuthError::Unauthorized,
                    ));
                }
                Err(e) => {
                    error!(error = %e, "Revocation check failed");
                    return Err(AuthError::Unauthorized);
                }
            }
        }

        let principal_id = claims.sub.parse::<i64>().map_err(|_| {
            reject(Stage::ClaimsValid, "non-numeric subject", AuthError::UnknownUser)
        })?;

        let lookup = timeout(
            self.config().lookup_timeout,
            self.store().lookup_by_id(principal_id),
        )
        .await;

        let principal = match lookup {
            Ok(Ok(Some(principal))) => principal,
            Ok(Ok(None)) => {
                return Err(reject(
                    Stage::ClaimsValid,
                    "principal not found",
                    AuthError::UnknownUser,
                ));
            }
            Ok(Err(e)) => {
                error!(error = %e, principal_id, "Principal lookup failed");
                return Err(AuthError::UnknownUser);
            }
            Err(_) => {
                warn!(principal_id, "Principal lookup timed out");
                return Err(AuthError::UnknownUser);
            }
        };

        let session = self.issue(principal, now)?;

        if let (Some(revocation), Some(jti)) = (self.revocation(), claims.jti.as_deref()) {
            let consumed = revocation
                .revoke(jti, claims.exp)
                .await
                .map_err(|e| AuthError::internal("Failed to revoke refresh token", e))?;
            if !consumed {
                return Err(reject(
                    Stage::UserResolved,
                    "token id consumed concurrently",
                    AuthError::Unauthorized,
                ));
            }
        }

        Ok(session)
    }

    /// End the session. Always yields the tombstone cookie.
    ///
    /// With a revocation list configured, a valid refresh cookie is revoked
    /// best-effort. Without a reading of the clock (`now` is `None`) the
    /// cookie cannot be checked for expiry and revocation is skipped.
    pub async fn end_session(&self, headers: &HeaderMap, now: Option<u64>) -> Cookie<'static> {
        if let (Some(revocation), Some(now)) = (self.revocation(), now) {
            let token_id = get_cookie(headers, self.cookies().name())
                .and_then(|token| self.codec().verify_refresh(token, now).ok())
                .and_then(|claims| claims.jti.map(|jti| (jti, claims.exp)));

            if let Some((jti, exp)) = token_id {
                if let Err(e) = revocation.revoke(&jti, exp).await {
                    warn!(error = %e, "Failed to revoke refresh token on logout");
                }
            }
        }

        self.cookies().tombstone()
    }

    fn issue(&self, principal: Principal, now: u64) -> Result<IssuedSession, AuthError> {
        let pair = self
            .issuer()
            .issue_pair(&principal, now)
            .map_err(|e| AuthError::internal("Failed to issue token pair", e))?;
        let cookie = self.cookies().session(&pair.refresh_token, now);

        Ok(IssuedSession {
            principal,
            pair,
            cookie,
        })
    }
}
