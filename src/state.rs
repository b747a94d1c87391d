//! Shared application state.
//!
//! The revocation registry and the attempt limiters are injectable services
//! owned here, never module-level globals, so call sites do not change if
//! they are swapped for a shared external store.

use std::sync::Arc;

use chrono::Duration;

use crate::auth::{AuthResolver, LoginAttemptLimiter, RevocationRegistry, TokenCodec};
use crate::config::AppConfig;
use crate::database::store::AuthStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuthStore>,
    pub codec: Arc<TokenCodec>,
    pub revocations: Arc<RevocationRegistry>,
    pub resolver: Arc<AuthResolver>,
    /// Interactive login limiter: 3 failures / 5 minutes. The registration
    /// and resend flows get their own instances
    /// (`LoginAttemptLimiter::for_registration`, `::for_resend`) when those
    /// handlers land.
    pub login_limiter: Arc<LoginAttemptLimiter>,
    pub session_ttl: Duration,
    pub admin_passphrase_hash: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn AuthStore>, config: &AppConfig) -> Self {
        let codec = Arc::new(TokenCodec::new(&config.security.token_secret));
        let revocations = Arc::new(RevocationRegistry::new());
        let resolver =
            Arc::new(AuthResolver::new(codec.clone(), revocations.clone(), store.clone()));

        Self {
            store,
            codec,
            revocations,
            resolver,
            login_limiter: Arc::new(LoginAttemptLimiter::for_login()),
            session_ttl: Duration::minutes(config.security.session_ttl_minutes as i64),
            admin_passphrase_hash: config.security.admin_passphrase_hash.clone(),
        }
    }
}
