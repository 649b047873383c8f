//! Token pair issuance.

use std::sync::Arc;
use std::time::Duration;

use super::types::{Principal, TokenPair};
use crate::config::AuthConfig;
use crate::jwt::{AccessClaims, Claims, RefreshClaims, TokenCodec, TokenError};

/// Mints access/refresh token pairs for verified principals.
#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<AuthConfig>,
    codec: TokenCodec,
    /// Whether refresh tokens carry a `jti` for revocation tracking
    mint_token_ids: bool,
}

impl TokenIssuer {
    pub fn new(config: Arc<AuthConfig>, codec: TokenCodec) -> Self {
        Self {
            config,
            codec,
            mint_token_ids: false,
        }
    }

    /// Give every refresh token a unique `jti`.
    pub fn with_token_ids(mut self) -> Self {
        self.mint_token_ids = true;
        self
    }

    /// Issue a fresh pair for `principal` as of `now` (Unix seconds).
    /// Nothing is persisted.
    pub fn issue_pair(&self, principal: &Principal, now: u64) -> Result<TokenPair, TokenError> {
        let subject = principal.id.to_string();
        let access_exp = expiry(now, self.config.access_ttl)?;
        let refresh_exp = expiry(now, self.config.refresh_ttl)?;

        let access = Claims::Access(AccessClaims {
            sub: subject.clone(),
            name: principal.display_name.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now,
            exp: access_exp,
        });

        let refresh = Claims::Refresh(RefreshClaims {
            sub: subject,
            iat: now,
            exp: refresh_exp,
            jti: self
                .mint_token_ids
                .then(|| uuid::Uuid::new_v4().to_string()),
        });

        Ok(TokenPair {
            token: self.codec.sign(&access)?,
            refresh_token: self.codec.sign(&refresh)?,
        })
    }
}

/// `now + ttl`, kept within the range cookie expiry dates can represent.
fn expiry(now: u64, ttl: Duration) -> Result<u64, TokenError> {
    now.checked_add(ttl.as_secs())
        .filter(|exp| i64::try_from(*exp).is_ok())
        .ok_or(TokenError::ExpiryOutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-testing-0123456789";
    const T0: u64 = 1_700_000_000;

    fn issuer() -> (TokenIssuer, TokenCodec) {
        let mut config = AuthConfig::new("reelauth.test", "reelauth.client", SECRET);
        config.access_ttl = Duration::from_secs(15 * 60);
        config.refresh_ttl = Duration::from_secs(24 * 60 * 60);
        let codec = TokenCodec::new(SECRET);
        (TokenIssuer::new(Arc::new(config), codec.clone()), codec)
    }

    fn ada() -> Principal {
        Principal::new(7, "Ada", "Lovelace")
    }

    #[test]
    fn test_access_token_claims() {
        let (issuer, codec) = issuer();
        let pair = issuer.issue_pair(&ada(), T0).unwrap();

        let claims = codec.verify_access(&pair.token, T0).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.name, "Ada Lovelace");
        assert_eq!(claims.iss, "reelauth.test");
        assert_eq!(claims.aud, "reelauth.client");
        assert_eq!(claims.iat, T0);
        assert_eq!(claims.exp, T0 + 900);
    }

    #[test]
    fn test_refresh_token_claims() {
        let (issuer, codec) = issuer();
        let pair = issuer.issue_pair(&ada(), T0).unwrap();

        let claims = codec.verify_refresh(&pair.refresh_token, T0).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.iat, T0);
        assert_eq!(claims.exp, T0 + 86400);
        assert_eq!(claims.jti, None);
    }

    #[test]
    fn test_access_and_refresh_expire_independently() {
        let (issuer, codec) = issuer();
        let pair = issuer.issue_pair(&ada(), T0).unwrap();

        let claims = codec.verify_access(&pair.token, T0 + 60).unwrap();
        assert_eq!(claims.sub, "7");

        assert!(matches!(
            codec.verify_access(&pair.token, T0 + 16 * 60),
            Err(TokenError::Expired)
        ));

        let refresh = codec
            .verify_refresh(&pair.refresh_token, T0 + 16 * 60)
            .unwrap();
        assert_eq!(refresh.sub, "7");
    }

    #[test]
    fn test_token_ids_are_unique() {
        let (issuer, codec) = issuer();
        let issuer = issuer.with_token_ids();

        let first = issuer.issue_pair(&ada(), T0).unwrap();
        let second = issuer.issue_pair(&ada(), T0).unwrap();

        let first_jti = codec
            .verify_refresh(&first.refresh_token, T0)
            .unwrap()
            .jti
            .expect("jti should be minted");
        let second_jti = codec
            .verify_refresh(&second.refresh_token, T0)
            .unwrap()
            .jti
            .expect("jti should be minted");

        assert_ne!(first_jti, second_jti);
    }

    #[test]
    fn test_pairs_issued_at_different_times_differ() {
        let (issuer, _) = issuer();

        let first = issuer.issue_pair(&ada(), T0).unwrap();
        let second = issuer.issue_pair(&ada(), T0 + 1).unwrap();

        assert_ne!(first.token, second.token);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let mut config = AuthConfig::new("reelauth.test", "reelauth.client", SECRET);
        config.refresh_ttl = Duration::from_secs(u64::MAX);
        let unbounded = TokenIssuer::new(Arc::new(config), TokenCodec::new(SECRET));

        assert!(matches!(
            unbounded.issue_pair(&ada(), T0),
            Err(TokenError::ExpiryOutOfRange)
        ));

        let (defaults, _) = issuer();
        assert!(matches!(
            defaults.issue_pair(&ada(), i64::MAX as u64),
            Err(TokenError::ExpiryOutOfRange)
        ));
    }
}
