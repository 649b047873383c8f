//! JWT token signing and verification.
//!
//! Access and refresh tokens are signed with the same HMAC secret but carry
//! different claim shapes. Both are mapped onto a single wire claim set here,
//! and a verified token is classified by which fields it carries.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Value of the `type` claim carried by access tokens.
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// The only algorithm this service signs with or accepts.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims of a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (stringified principal id)
    pub sub: String,
    /// Display name of the principal
    pub name: String,
    /// Issuer identity of this service
    pub iss: String,
    /// Audience the token was minted for
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Claims of a long-lived refresh token.
///
/// Subject and timestamps only, with no issuer, audience or name. `jti` is only present
/// when a revocation list is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    /// Subject (stringified principal id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Token id, used as the revocation key
    pub jti: Option<String>,
}

/// A verified claim set, tagged by token kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl Claims {
    pub fn expires_at(&self) -> u64 {
        match self {
            Claims::Access(claims) => claims.exp,
            Claims::Refresh(claims) => claims.exp,
        }
    }
}

/// The claim mapping as it appears in the token payload.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    iat: u64,
    exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
}

impl From<&Claims> for WireClaims {
    fn from(claims: &Claims) -> Self {
        match claims {
            Claims::Access(c) => WireClaims {
                sub: c.sub.clone(),
                iat: c.iat,
                exp: c.exp,
                iss: Some(c.iss.clone()),
                aud: Some(c.aud.clone()),
                name: Some(c.name.clone()),
                token_type: Some(ACCESS_TOKEN_TYPE.to_string()),
                jti: None,
            },
            Claims::Refresh(c) => WireClaims {
                sub: c.sub.clone(),
                iat: c.iat,
                exp: c.exp,
                iss: None,
                aud: None,
                name: None,
                token_type: None,
                jti: c.jti.clone(),
            },
        }
    }
}

impl TryFrom<WireClaims> for Claims {
    type Error = TokenError;

    fn try_from(wire: WireClaims) -> Result<Self, Self::Error> {
        match (wire.token_type, wire.iss, wire.aud, wire.name) {
            (Some(token_type), Some(iss), Some(aud), Some(name))
                if token_type == ACCESS_TOKEN_TYPE && wire.jti.is_none() =>
            {
                Ok(Claims::Access(AccessClaims {
                    sub: wire.sub,
                    name,
                    iss,
                    aud,
                    iat: wire.iat,
                    exp: wire.exp,
                }))
            }
            (None, None, None, None) => Ok(Claims::Refresh(RefreshClaims {
                sub: wire.sub,
                iat: wire.iat,
                exp: wire.exp,
                jti: wire.jti,
            })),
            // Partial or mixed shapes are neither kind.
            _ => Err(TokenError::Malformed),
        }
    }
}

/// Signs and verifies tokens with a single symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec for the given secret.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        // Expiry is checked against the caller's clock in `verify`, and
        // issuer/audience binding is the access verifier's job.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a claim set into the compact three-part token encoding.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            &WireClaims::from(claims),
            &self.encoding_key,
        )
        .map_err(TokenError::Encoding)
    }

    /// Verify a token of either kind and check it has not expired at `now`.
    pub fn verify(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        check_expiry(claims.expires_at(), now)?;
        Ok(claims)
    }

    /// Verify a token that must be an access token.
    pub fn verify_access(&self, token: &str, now: u64) -> Result<AccessClaims, TokenError> {
        match self.decode(token)? {
            Claims::Access(claims) => {
                check_expiry(claims.exp, now)?;
                Ok(claims)
            }
            Claims::Refresh(_) => Err(TokenError::WrongTokenType),
        }
    }

    /// Verify a token that must be a refresh token.
    pub fn verify_refresh(&self, token: &str, now: u64) -> Result<RefreshClaims, TokenError> {
        match self.decode(token)? {
            Claims::Refresh(claims) => {
                check_expiry(claims.exp, now)?;
                Ok(claims)
            }
            Claims::Access(_) => Err(TokenError::WrongTokenType),
        }
    }

    /// Check the declared algorithm, then the signature, then the claim shape.
    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let header = jsonwebtoken::decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::from_decode)?;

        Claims::try_from(data.claims)
    }
}

fn check_expiry(exp: u64, now: u64) -> Result<(), TokenError> {
    if exp < now {
        return Err(TokenError::Expired);
    }
    Ok(())
}

/// Current time as Unix seconds.
pub fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Time)
}

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("unsupported token algorithm")]
    UnsupportedAlgorithm,
    #[error("wrong token type")]
    WrongTokenType,
    #[error("system time error")]
    Time,
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
}

impl TokenError {
    fn from_decode(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}
