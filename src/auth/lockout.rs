//! Per-source-address login attempt limiting.
//!
//! Keyed by address only, no per-account dimension: the coarse key is a
//! deliberate trade-off kept from the product. Each guarded flow owns its
//! own limiter instance with its own threshold and window.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Result of a lockout check.
#[derive(Debug, Clone, PartialEq)]
pub struct LockoutStatus {
    pub locked: bool,
    /// Time until the lock clears. Present only while locked; exposed to
    /// callers since it helps legitimate users.
    pub remaining: Option<Duration>,
}

impl LockoutStatus {
    fn open() -> Self {
        Self { locked: false, remaining: None }
    }
}

#[derive(Debug)]
struct AttemptState {
    failures: u32,
    window_reset_at: Instant,
}

/// Rolling-window failure counter per source address.
///
/// After `max_attempts` failures within `window`, further attempts from that
/// address are rejected until the window anchored at the first failure
/// expires. One successful authentication clears the address entirely.
pub struct LoginAttemptLimiter {
    max_attempts: u32,
    window: Duration,
    entries: Mutex<HashMap<IpAddr, AttemptState>>,
}

impl LoginAttemptLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self { max_attempts, window, entries: Mutex::new(HashMap::new()) }
    }

    /// Interactive login: 3 failures within 5 minutes.
    pub fn for_login() -> Self {
        Self::new(3, Duration::from_secs(5 * 60))
    }

    /// Registration: 5 attempts within 24 hours.
    pub fn for_registration() -> Self {
        Self::new(5, Duration::from_secs(24 * 60 * 60))
    }

    /// Verification-mail resend: 3 attempts within 1 hour.
    pub fn for_resend() -> Self {
        Self::new(3, Duration::from_secs(60 * 60))
    }

    /// Check whether the address is currently locked out. Entries whose
    /// window has expired are cleared on the way.
    pub fn check(&self, addr: IpAddr) -> LockoutStatus {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("lockout lock poisoned");

        match entries.get(&addr) {
            Some(state) if now >= state.window_reset_at => {
                entries.remove(&addr);
                LockoutStatus::open()
            }
            Some(state) if state.failures >= self.max_attempts => LockoutStatus {
                locked: true,
                remaining: Some(state.window_reset_at - now),
            },
            _ => LockoutStatus::open(),
        }
    }

    /// Record a failed attempt. The window is anchored at the first failure.
    pub fn record_failure(&self, addr: IpAddr) {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("lockout lock poisoned");

        let state = entries
            .entry(addr)
            .and_modify(|state| {
                if now >= state.window_reset_at {
                    // Stale window: start over
                    state.failures = 0;
                    state.window_reset_at = now + self.window;
                }
            })
            .or_insert_with(|| AttemptState { failures: 0, window_reset_at: now + self.window });

        state.failures += 1;
        if state.failures >= self.max_attempts {
            tracing::warn!("Address {} locked out after {} failures", addr, state.failures);
        }
    }

    /// Clear the counter for an address, giving it a fresh budget.
    pub fn reset(&self, addr: IpAddr) {
        let mut entries = self.entries.lock().expect("lockout lock poisoned");
        entries.remove(&addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> IpAddr {
        "203.0.113.7".parse().unwrap()
    }

    #[test]
    fn fresh_address_is_open() {
        let limiter = LoginAttemptLimiter::for_login();
        assert_eq!(limiter.check(addr()), LockoutStatus::open());
    }

    #[test]
    fn locks_after_three_failures() {
        let limiter = LoginAttemptLimiter::for_login();
        limiter.record_failure(addr());
        limiter.record_failure(addr());
        assert!(!limiter.check(addr()).locked);

        limiter.record_failure(addr());
        let status = limiter.check(addr());
        assert!(status.locked);
        assert!(status.remaining.unwrap() <= Duration::from_secs(5 * 60));
    }

    #[test]
    fn success_restores_full_budget() {
        let limiter = LoginAttemptLimiter::for_login();
        for _ in 0..3 {
            limiter.record_failure(addr());
        }
        assert!(limiter.check(addr()).locked);

        limiter.reset(addr());
        assert!(!limiter.check(addr()).locked);

        // Fresh budget of three
        limiter.record_failure(addr());
        limiter.record_failure(addr());
        assert!(!limiter.check(addr()).locked);
        limiter.record_failure(addr());
        assert!(limiter.check(addr()).locked);
    }

    #[test]
    fn expired_window_clears_the_counter() {
        let limiter = LoginAttemptLimiter::new(3, Duration::from_millis(0));
        for _ in 0..3 {
            limiter.record_failure(addr());
        }
        // Window of zero expires immediately
        assert!(!limiter.check(addr()).locked);
    }

    #[test]
    fn flow_specific_limits_apply() {
        let registration = LoginAttemptLimiter::for_registration();
        for _ in 0..4 {
            registration.record_failure(addr());
        }
        assert!(!registration.check(addr()).locked);
        registration.record_failure(addr());
        assert!(registration.check(addr()).locked);

        let resend = LoginAttemptLimiter::for_resend();
        for _ in 0..3 {
            resend.record_failure(addr());
        }
        assert!(resend.check(addr()).locked);
    }

    #[test]
    fn addresses_are_independent() {
        let limiter = LoginAttemptLimiter::for_login();
        let other: IpAddr = "198.51.100.23".parse().unwrap();
        for _ in 0..3 {
            limiter.record_failure(addr());
        }
        assert!(limiter.check(addr()).locked);
        assert!(!limiter.check(other).locked);
    }
}
