//! Token-based authentication.
//!
//! Dual-token system: short-lived access tokens (15 min by default) sent as
//! `Authorization: Bearer`, and longer-lived refresh tokens (24 h) carried
//! only in an HTTP-only cookie and exchanged for a fresh pair on refresh.
//! Refresh tokens are stateless unless a `RevocationList` is configured.

mod cookie;
mod errors;
mod extractors;
mod issuer;
mod password;
mod session;
mod state;
mod store;
mod types;

pub use cookie::{SessionCookies, get_cookie};
pub use errors::AuthError;
pub use extractors::{AccessVerifier, Auth};
pub use issuer::TokenIssuer;
pub use password::{hash_password, verify_password};
pub use state::{AuthState, HasAuthBackend};
pub use store::{PrincipalStore, RevocationList, StoreError};
pub use types::{AuthenticatedUser, CredentialRecord, IssuedSession, Principal, TokenPair};
