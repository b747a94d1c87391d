//! Authorization Context Resolver.
//!
//! Turns an inbound request into an immutable [`AuthContext`] or a uniform
//! rejection. Both credential sources (bearer token, legacy session cookie)
//! funnel through one tagged enum before any business logic runs, so there
//! is exactly one place that constructs a context.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::hints;
use super::revocation::RevocationRegistry;
use super::token::{SessionClaims, TokenCodec};
use super::{AuthError, FALLBACK_LOGIN_ID};
use crate::database::models::{Caretaker, Role};
use crate::database::store::AuthStore;

/// Everything the resolver needs from a request, detached from any HTTP
/// framework type so the resolution logic is testable in isolation.
#[derive(Debug, Clone, Default)]
pub struct RequestAuth {
    /// Bearer token from the Authorization header.
    pub bearer: Option<String>,
    /// Legacy session identifier cookie.
    pub legacy_session: Option<String>,
    /// Request URL path.
    pub path: String,
    /// Raw query string, if any.
    pub query: Option<String>,
    /// `Referer` header, if any.
    pub referer: Option<String>,
}

/// The credential a request presented, bearer preferred.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Bearer(String),
    LegacySession(String),
}

impl RequestAuth {
    pub fn credential(&self) -> Option<CredentialSource> {
        if let Some(token) = &self.bearer {
            return Some(CredentialSource::Bearer(token.clone()));
        }
        self.legacy_session.clone().map(CredentialSource::LegacySession)
    }
}

/// Immutable identity handed to every protected handler.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// `None` for global administrators and for the fallback caretaker,
    /// whose identity must never be attributed as a real person.
    pub operator_id: Option<Uuid>,
    pub role: Option<Role>,
    pub tenant_id: Option<Uuid>,
    pub tenant_slug: Option<String>,
    pub is_global_admin: bool,
}

/// Resolves requests to contexts. Shared immutable state apart from the
/// injected revocation registry.
pub struct AuthResolver {
    codec: Arc<TokenCodec>,
    revocations: Arc<RevocationRegistry>,
    store: Arc<dyn AuthStore>,
}

impl AuthResolver {
    pub fn new(
        codec: Arc<TokenCodec>,
        revocations: Arc<RevocationRegistry>,
        store: Arc<dyn AuthStore>,
    ) -> Self {
        Self { codec, revocations, store }
    }

    /// Resolve a request to an [`AuthContext`].
    ///
    /// Every failure surfaces as `Unauthenticated` with no externally
    /// visible distinction between missing, malformed, expired, and revoked
    /// credentials; the specific cause goes to the logs only.
    pub async fn resolve(&self, request: &RequestAuth) -> Result<AuthContext, AuthError> {
        match request.credential() {
            None => Err(AuthError::Unauthenticated),
            Some(CredentialSource::Bearer(token)) => {
                if self.revocations.is_revoked(&token) {
                    debug!("Rejecting invalidated session token");
                    return Err(AuthError::Unauthenticated);
                }
                let claims = self.codec.verify(&token)?;
                if claims.is_global_admin {
                    self.resolve_global_admin(request, claims).await
                } else {
                    self.resolve_caretaker(claims).await
                }
            }
            Some(CredentialSource::LegacySession(session_id)) => {
                self.resolve_legacy_session(&session_id).await
            }
        }
    }

    /// Global administrator: the tenant claim is not trusted as final. The
    /// family context is re-derived from the ordered hint extractors; a
    /// candidate that does not name an existing family falls through, and
    /// no resolvable hint at all yields a context without a family.
    async fn resolve_global_admin(
        &self,
        request: &RequestAuth,
        claims: SessionClaims,
    ) -> Result<AuthContext, AuthError> {
        for candidate in hints::candidates(request) {
            let family = self
                .store
                .find_family_by_slug(&candidate)
                .await
                .map_err(|e| AuthError::Internal(format!("family lookup: {}", e)))?;
            if let Some(family) = family {
                debug!("Global admin request scoped to family '{}'", family.slug);
                return Ok(AuthContext {
                    operator_id: None,
                    role: Some(claims.role),
                    tenant_id: Some(family.id),
                    tenant_slug: Some(family.slug),
                    is_global_admin: true,
                });
            }
        }

        Ok(AuthContext {
            operator_id: None,
            role: Some(claims.role),
            tenant_id: None,
            tenant_slug: None,
            is_global_admin: true,
        })
    }

    /// Ordinary caretaker claims. If the claims point at the reserved
    /// fallback caretaker, the identity is nulled out before business logic
    /// ever sees it.
    async fn resolve_caretaker(&self, claims: SessionClaims) -> Result<AuthContext, AuthError> {
        let operator_id = match claims.operator_id {
            Some(id) => {
                let caretaker = self
                    .store
                    .find_caretaker_by_id(id)
                    .await
                    .map_err(|e| AuthError::Internal(format!("caretaker lookup: {}", e)))?;
                match caretaker {
                    Some(c) if c.login_id == FALLBACK_LOGIN_ID => None,
                    _ => Some(id),
                }
            }
            None => None,
        };

        Ok(AuthContext {
            operator_id,
            role: Some(claims.role),
            tenant_id: claims.tenant_id,
            tenant_slug: claims.tenant_slug,
            is_global_admin: false,
        })
    }

    /// Backward-compatibility path: the session identifier is looked up
    /// directly against the caretaker store, no token decoding involved.
    async fn resolve_legacy_session(&self, session_id: &str) -> Result<AuthContext, AuthError> {
        let caretaker = self
            .store
            .find_caretaker_by_session(session_id)
            .await
            .map_err(|e| AuthError::Internal(format!("session lookup: {}", e)))?;

        let Some(caretaker) = caretaker.filter(|c| c.is_active) else {
            debug!("Legacy session id did not resolve");
            return Err(AuthError::Unauthenticated);
        };

        let family = self
            .store
            .find_family_by_id(caretaker.family_id)
            .await
            .map_err(|e| AuthError::Internal(format!("family lookup: {}", e)))?;
        let Some(family) = family else {
            debug!("Legacy session names a missing or inactive family");
            return Err(AuthError::Unauthenticated);
        };

        Ok(AuthContext {
            operator_id: mask_fallback(&caretaker),
            role: Some(caretaker.role),
            tenant_id: Some(family.id),
            tenant_slug: Some(family.slug),
            is_global_admin: false,
        })
    }
}

fn mask_fallback(caretaker: &Caretaker) -> Option<Uuid> {
    if caretaker.login_id == FALLBACK_LOGIN_ID {
        None
    } else {
        Some(caretaker.id)
    }
}

impl AuthContext {
    /// Caller may act as an administrator of the family in scope: a family
    /// ADMIN (the fallback caretaker included) or a global administrator.
    pub fn is_family_admin(&self) -> bool {
        self.is_global_admin || self.role == Some(Role::Admin)
    }
}
