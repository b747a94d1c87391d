//! Process-local registry of explicitly invalidated session tokens.
//!
//! A revoked token is retained until its natural expiry, at which point it
//! would be rejected anyway and the entry becomes garbage. Entries are
//! dropped lazily on lookup and in bulk by a periodic background sweep.
//! State is process-local and lost on restart; that weakness is accepted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use super::token::decode_expiry_unverified;

/// Concurrency-safe set of revoked tokens, keyed by the exact token string.
pub struct RevocationRegistry {
    // token string -> expiry epoch seconds
    entries: Mutex<HashMap<String, i64>>,
}

impl Default for RevocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Revoke a token until its embedded expiry.
    ///
    /// The expiry is decoded without signature verification: revocation must
    /// work even for tokens this process would no longer accept. Returns
    /// `false` when the string carries no decodable expiry, in which case
    /// nothing is stored.
    pub fn revoke(&self, token: &str) -> bool {
        let Some(exp) = decode_expiry_unverified(token) else {
            tracing::debug!("Revocation skipped: token has no decodable expiry");
            return false;
        };

        let mut entries = self.entries.lock().expect("revocation lock poisoned");
        entries.insert(token.to_string(), exp);
        true
    }

    /// Membership check. Entries whose expiry has passed are removed on
    /// lookup and reported as not revoked.
    pub fn is_revoked(&self, token: &str) -> bool {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.lock().expect("revocation lock poisoned");

        match entries.get(token) {
            Some(&exp) if exp > now => true,
            Some(_) => {
                entries.remove(token);
                false
            }
            None => false,
        }
    }

    /// Delete all entries whose expiry has passed. Returns the number purged.
    /// Holds the lock for a single pass only.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.lock().expect("revocation lock poisoned");
        let before = entries.len();
        entries.retain(|_, &mut exp| exp > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("revocation lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the periodic sweep as a background task, independent of request
    /// handling.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = self.sweep_expired();
                if purged > 0 {
                    tracing::info!("Revocation sweep purged {} expired entries", purged);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenCodec;
    use crate::database::models::Role;
    use chrono::Duration as ChronoDuration;

    fn live_token() -> String {
        TokenCodec::new("test-secret")
            .issue(None, Role::User, None, None, false, ChronoDuration::minutes(30))
            .unwrap()
    }

    fn expired_token() -> String {
        TokenCodec::new("test-secret")
            .issue(None, Role::User, None, None, false, ChronoDuration::minutes(-5))
            .unwrap()
    }

    #[test]
    fn revoked_token_is_reported_revoked() {
        let registry = RevocationRegistry::new();
        let token = live_token();
        assert!(registry.revoke(&token));
        assert!(registry.is_revoked(&token));
    }

    #[test]
    fn unknown_token_is_not_revoked() {
        let registry = RevocationRegistry::new();
        assert!(!registry.is_revoked(&live_token()));
    }

    #[test]
    fn garbage_is_not_stored() {
        let registry = RevocationRegistry::new();
        assert!(!registry.revoke("definitely-not-a-token"));
        assert!(registry.is_empty());
    }

    #[test]
    fn expired_entry_is_dropped_on_lookup() {
        let registry = RevocationRegistry::new();
        let token = expired_token();
        assert!(registry.revoke(&token));
        assert_eq!(registry.len(), 1);
        // Past expiry: not revoked any more, entry lazily removed
        assert!(!registry.is_revoked(&token));
        assert!(registry.is_empty());
    }

    #[test]
    fn sweep_purges_only_expired_entries() {
        let registry = RevocationRegistry::new();
        let live = live_token();
        let dead = expired_token();
        registry.revoke(&live);
        registry.revoke(&dead);

        assert_eq!(registry.sweep_expired(), 1);
        assert!(registry.is_revoked(&live));
        assert_eq!(registry.len(), 1);
    }
}
