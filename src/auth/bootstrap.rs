//! Family bootstrap and login resolution.
//!
//! A family with no real caretakers can be entered with its shared security
//! PIN; the first such login materializes the reserved fallback caretaker
//! (and default settings) on demand. The moment a family has at least one
//! real caretaker, the shortcut is closed for that family: fallback logins
//! fail with `Forbidden` no matter what secret they present. The gate is
//! evaluated per family from its own caretaker count, so deleting every real
//! caretaker naturally reopens it.

use tracing::{info, warn};

use super::secrets::{hash_secret, verify_secret, SecretPolicy};
use super::AuthError;
use crate::database::models::{Caretaker, Family, Role};
use crate::database::store::AuthStore;

/// Reserved per-family login identifier of the fallback system caretaker.
pub const FALLBACK_LOGIN_ID: &str = "00";

/// Security PIN assumed for a family whose settings row does not exist yet.
/// Matches the value seeded by the setup wizard.
pub const DEFAULT_SECURITY_PIN: &str = "111222";

/// Successful outcome of a family login.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaretaker {
    pub caretaker: Caretaker,
    pub role: Role,
}

/// Authenticate a login attempt against one family.
///
/// Evaluated in order:
/// 1. Zero real caretakers: the submitted secret is checked against the
///    family's security PIN (settings are created lazily with documented
///    defaults); a match materializes the fallback caretaker and succeeds
///    as `ADMIN`.
/// 2. At least one real caretaker: any attempt presenting the reserved
///    fallback login id, or no login id at all, is `Forbidden` regardless
///    of the secret.
/// 3. Otherwise: normal verification scoped to `(family, login_id)`.
pub async fn authenticate_family(
    store: &dyn AuthStore,
    family: &Family,
    login_id: Option<&str>,
    secret: &str,
) -> Result<AuthenticatedCaretaker, AuthError> {
    let real_caretakers = store
        .count_real_caretakers(family.id)
        .await
        .map_err(|e| AuthError::Internal(format!("caretaker count: {}", e)))?;

    if real_caretakers == 0 {
        return bootstrap_login(store, family, secret).await;
    }

    // Real caretakers exist: the bootstrap shortcut is closed for this
    // family, even if the fallback row is still present.
    let login_id = match login_id {
        None | Some(FALLBACK_LOGIN_ID) => {
            warn!(
                "Fallback login rejected for family '{}': real caretakers exist",
                family.slug
            );
            return Err(AuthError::Forbidden);
        }
        Some(id) => id,
    };

    let caretaker = store
        .find_caretaker_by_login(family.id, login_id)
        .await
        .map_err(|e| AuthError::Internal(format!("caretaker lookup: {}", e)))?;

    let Some(caretaker) = caretaker.filter(|c| c.is_active) else {
        return Err(AuthError::Unauthenticated);
    };

    if !verify_secret(secret, &caretaker.pin, SecretPolicy::Plaintext)? {
        return Err(AuthError::Unauthenticated);
    }

    let role = caretaker.role;
    Ok(AuthenticatedCaretaker { caretaker, role })
}

/// Zero-caretaker path: verify the shared security PIN and materialize the
/// fallback caretaker.
async fn bootstrap_login(
    store: &dyn AuthStore,
    family: &Family,
    secret: &str,
) -> Result<AuthenticatedCaretaker, AuthError> {
    let settings = store
        .get_settings(family.id)
        .await
        .map_err(|e| AuthError::Internal(format!("settings lookup: {}", e)))?;

    let matched = match &settings {
        Some(settings) => verify_secret(secret, &settings.security_pin, SecretPolicy::Hashed)?,
        // No settings row yet: the PIN in force is the seeded default
        None => verify_secret(secret, DEFAULT_SECURITY_PIN, SecretPolicy::Plaintext)?,
    };

    if !matched {
        return Err(AuthError::Unauthenticated);
    }

    // Credentials matched; a failure to materialize state now must fail
    // closed rather than proceed without an identity.
    let security_pin_hash = hash_secret(secret)?;
    let outcome = store
        .bootstrap_fallback(family.id, FALLBACK_LOGIN_ID, secret, &security_pin_hash)
        .await
        .map_err(|e| AuthError::Internal(format!("fallback bootstrap: {}", e)))?;

    info!("Bootstrap login for family '{}' via fallback caretaker", family.slug);
    Ok(AuthenticatedCaretaker { caretaker: outcome.caretaker, role: Role::Admin })
}
