//! Authentication and family-scoped authorization core.
//!
//! Everything protected handlers depend on lives here: session token
//! issuance/verification, the in-process revocation registry, the per-address
//! login attempt limiter, credential verification, the family bootstrap
//! state machine, and the resolver that turns an inbound request into an
//! [`AuthContext`].

pub mod bootstrap;
pub mod hints;
pub mod lockout;
pub mod resolver;
pub mod revocation;
pub mod secrets;
pub mod token;

pub use bootstrap::{authenticate_family, AuthenticatedCaretaker, FALLBACK_LOGIN_ID};
pub use lockout::{LockoutStatus, LoginAttemptLimiter};
pub use resolver::{AuthContext, AuthResolver, CredentialSource, RequestAuth};
pub use revocation::RevocationRegistry;
pub use secrets::{hash_secret, verify_secret, SecretPolicy};
pub use token::{decode_expiry_unverified, SessionClaims, TokenCodec};

use thiserror::Error;

/// Failure taxonomy of the authorization core.
///
/// Every unauthenticated cause (missing, malformed, expired, revoked) is
/// collapsed into the single `Unauthenticated` variant before it leaves this
/// module; the distinction only ever reaches the logs.
#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("not permitted")]
    Forbidden,

    #[error("family not found: {0}")]
    TenantNotFound(String),

    #[error("rate limited, retry in {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}
