//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Client-visible authentication failures.
///
/// Every variant renders as a fixed message. Signature, shape and algorithm
/// failures all collapse into `InvalidToken`, and a missing user is never
/// told apart from a wrong password.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing or malformed authorization header")]
    MissingOrMalformedHeader,
    #[error("untrusted token issuer")]
    UntrustedIssuer,
    #[error("token has expired")]
    ExpiredToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("no session")]
    NoSession,
    #[error("unauthorized")]
    Unauthorized,
    #[error("unknown user")]
    UnknownUser,
    #[error("invalid credentials")]
    CredentialMismatch,
    #[error("internal error")]
    Internal,
}

impl AuthError {
    /// Log `e` with `context` and return a generic internal error.
    pub fn internal(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::MissingOrMalformedHeader => "Missing or malformed authorization header",
            AuthError::UntrustedIssuer => "Untrusted token issuer",
            AuthError::ExpiredToken => "Token has expired",
            AuthError::InvalidToken => "Invalid token",
            AuthError::NoSession => "No session",
            AuthError::Unauthorized => "Unauthorized",
            AuthError::UnknownUser => "Unknown user",
            AuthError::CredentialMismatch => "Invalid credentials",
            AuthError::Internal => "Internal server error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
