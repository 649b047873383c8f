//! Collaborator interfaces the auth core calls into.

use async_trait::async_trait;

use super::types::{CredentialRecord, Principal};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Looks up principals for login and refresh.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Find a principal and its password hash by login identifier (email).
    async fn lookup_by_credential(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, StoreError>;

    /// Find a principal by id.
    async fn lookup_by_id(&self, id: i64) -> Result<Option<Principal>, StoreError>;
}

/// Optional record of refresh token ids that may no longer be used.
///
/// Without one, refresh tokens stay valid until they expire.
#[async_trait]
pub trait RevocationList: Send + Sync {
    async fn is_revoked(&self, token_id: &str) -> Result<bool, StoreError>;

    /// Revoke `token_id`. `expires_at` is the token's own expiry, after which
    /// the entry can be purged.
    ///
    /// Returns `false` if the id was already revoked.
    async fn revoke(&self, token_id: &str, expires_at: u64) -> Result<bool, StoreError>;
}
