//! Session token issuance and verification.
//!
//! Tokens are compact signed JWTs (HS256) carrying identity and family
//! claims. The codec is stateless apart from the signing key, which is fixed
//! at startup. Verification checks signature, structure, and expiry only:
//! whether the family or caretaker still exists is the caller's concern.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::database::models::Role;

/// Claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Caretaker ID. `None` for global administrator sessions.
    pub operator_id: Option<Uuid>,
    pub role: Role,
    /// Family ID. `None` for global administrator sessions, whose family
    /// context is re-derived on every request.
    pub tenant_id: Option<Uuid>,
    pub tenant_slug: Option<String>,
    pub is_global_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies session tokens with a process-wide HS256 key.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a signed token for the given identity, valid for `ttl`.
    pub fn issue(
        &self,
        operator_id: Option<Uuid>,
        role: Role,
        tenant_id: Option<Uuid>,
        tenant_slug: Option<String>,
        is_global_admin: bool,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            operator_id,
            role,
            tenant_id,
            tenant_slug,
            is_global_admin,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token encode: {}", e)))
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// Any failure (bad signature, malformed token, expired) collapses to
    /// `Unauthenticated`.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        // No expiry leeway: the revocation registry drops entries at exact
        // `exp`, so a grace window here would let a revoked token back in.
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {}", e);
                AuthError::Unauthenticated
            })
    }
}

/// Decode a token's embedded expiry without verifying its signature.
///
/// Used by the revocation registry, which must retain even tokens it cannot
/// vouch for until their natural expiry. Returns `None` when the string has
/// no decodable `exp` claim.
pub fn decode_expiry_unverified(token: &str) -> Option<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<serde_json::Value>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .and_then(|data| data.claims.get("exp").and_then(|v| v.as_i64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("unit-test-signing-secret")
    }

    fn sample_claims(codec: &TokenCodec, ttl: Duration) -> (String, Uuid, Uuid) {
        let operator_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let token = codec
            .issue(
                Some(operator_id),
                Role::Admin,
                Some(tenant_id),
                Some("acme".into()),
                false,
                ttl,
            )
            .unwrap();
        (token, operator_id, tenant_id)
    }

    #[test]
    fn roundtrip_preserves_claims() {
        let codec = codec();
        let (token, operator_id, tenant_id) = sample_claims(&codec, Duration::minutes(30));

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.operator_id, Some(operator_id));
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.tenant_id, Some(tenant_id));
        assert_eq!(claims.tenant_slug.as_deref(), Some("acme"));
        assert!(!claims.is_global_admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let (token, _, _) = sample_claims(&codec, Duration::seconds(-120));
        assert_eq!(codec.verify(&token), Err(AuthError::Unauthenticated));
    }

    #[test]
    fn expiry_has_no_grace_window() {
        let codec = codec();
        // Just past expiry, well inside the 60s leeway jsonwebtoken would
        // apply by default
        let (token, _, _) = sample_claims(&codec, Duration::seconds(-5));
        assert_eq!(codec.verify(&token), Err(AuthError::Unauthenticated));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = codec();
        let (token, _, _) = sample_claims(&codec, Duration::minutes(30));
        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(codec.verify(&tampered), Err(AuthError::Unauthenticated));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let codec = codec();
        let other = TokenCodec::new("a-different-secret");
        let (token, _, _) = sample_claims(&codec, Duration::minutes(30));
        assert_eq!(other.verify(&token), Err(AuthError::Unauthenticated));
    }

    #[test]
    fn expiry_decodes_without_signature_check() {
        let codec = codec();
        let (token, _, _) = sample_claims(&codec, Duration::minutes(30));
        let exp = decode_expiry_unverified(&token).unwrap();
        assert!(exp > Utc::now().timestamp());
    }

    #[test]
    fn garbage_has_no_decodable_expiry() {
        assert_eq!(decode_expiry_unverified("not-a-token"), None);
    }
}
