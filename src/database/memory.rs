//! In-memory [`AuthStore`] used by the test suite.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::models::{Caretaker, Family, FamilySettings, Role};
use super::store::{AuthStore, BootstrapOutcome, StoreError};
use crate::auth::FALLBACK_LOGIN_ID;

#[derive(Default)]
struct State {
    families: Vec<Family>,
    caretakers: Vec<Caretaker>,
    settings: Vec<FamilySettings>,
}

/// Mutex-guarded store with the same observable behavior as the Postgres
/// implementation, plus fault injection for the bootstrap write path.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_bootstrap: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `bootstrap_fallback` call fail, to exercise the
    /// fail-closed path.
    pub fn fail_next_bootstrap(&self) {
        self.fail_bootstrap.store(true, Ordering::SeqCst);
    }

    pub fn add_family(&self, slug: &str, name: &str) -> Family {
        let now = Utc::now();
        let family = Family {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().families.push(family.clone());
        family
    }

    pub fn add_caretaker(
        &self,
        family_id: Uuid,
        login_id: &str,
        display_name: &str,
        role: Role,
        pin: &str,
    ) -> Caretaker {
        let now = Utc::now();
        let caretaker = Caretaker {
            id: Uuid::new_v4(),
            family_id,
            login_id: login_id.to_string(),
            display_name: display_name.to_string(),
            role,
            pin: pin.to_string(),
            is_active: true,
            session_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.state.lock().unwrap().caretakers.push(caretaker.clone());
        caretaker
    }

    pub fn set_session_id(&self, caretaker_id: Uuid, session_id: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(caretaker) = state.caretakers.iter_mut().find(|c| c.id == caretaker_id) {
            caretaker.session_id = Some(session_id.to_string());
        }
    }

    pub fn soft_delete_caretaker(&self, caretaker_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        if let Some(caretaker) = state.caretakers.iter_mut().find(|c| c.id == caretaker_id) {
            caretaker.deleted_at = Some(Utc::now());
        }
    }

    pub fn set_settings(&self, family_id: Uuid, security_pin_hash: &str) -> FamilySettings {
        let now = Utc::now();
        let settings = FamilySettings {
            id: Uuid::new_v4(),
            family_id,
            security_pin: security_pin_hash.to_string(),
            timezone: "UTC".to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.lock().unwrap();
        state.settings.retain(|s| s.family_id != family_id);
        state.settings.push(settings.clone());
        settings
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn find_family_by_slug(&self, slug: &str) -> Result<Option<Family>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.families.iter().find(|f| f.slug == slug && f.is_active).cloned())
    }

    async fn find_family_by_id(&self, id: Uuid) -> Result<Option<Family>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.families.iter().find(|f| f.id == id && f.is_active).cloned())
    }

    async fn find_caretaker_by_login(
        &self,
        family_id: Uuid,
        login_id: &str,
    ) -> Result<Option<Caretaker>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .caretakers
            .iter()
            .find(|c| c.family_id == family_id && c.login_id == login_id && c.deleted_at.is_none())
            .cloned())
    }

    async fn find_caretaker_by_id(&self, id: Uuid) -> Result<Option<Caretaker>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.caretakers.iter().find(|c| c.id == id && c.deleted_at.is_none()).cloned())
    }

    async fn find_caretaker_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Caretaker>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .caretakers
            .iter()
            .find(|c| c.session_id.as_deref() == Some(session_id) && c.deleted_at.is_none())
            .cloned())
    }

    async fn count_real_caretakers(&self, family_id: Uuid) -> Result<i64, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .caretakers
            .iter()
            .filter(|c| {
                c.family_id == family_id
                    && c.login_id != FALLBACK_LOGIN_ID
                    && c.deleted_at.is_none()
            })
            .count() as i64)
    }

    async fn get_settings(&self, family_id: Uuid) -> Result<Option<FamilySettings>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.settings.iter().find(|s| s.family_id == family_id).cloned())
    }

    async fn bootstrap_fallback(
        &self,
        family_id: Uuid,
        fallback_login_id: &str,
        pin: &str,
        security_pin_hash: &str,
    ) -> Result<BootstrapOutcome, StoreError> {
        if self.fail_bootstrap.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Connection("injected bootstrap failure".into()));
        }

        let mut state = self.state.lock().unwrap();
        let now = Utc::now();

        let settings = match state.settings.iter().find(|s| s.family_id == family_id) {
            Some(settings) => settings.clone(),
            None => {
                let settings = FamilySettings {
                    id: Uuid::new_v4(),
                    family_id,
                    security_pin: security_pin_hash.to_string(),
                    timezone: "UTC".to_string(),
                    created_at: now,
                    updated_at: now,
                };
                state.settings.push(settings.clone());
                settings
            }
        };

        let caretaker = match state
            .caretakers
            .iter()
            .find(|c| {
                c.family_id == family_id
                    && c.login_id == fallback_login_id
                    && c.deleted_at.is_none()
            })
            .cloned()
        {
            Some(caretaker) => caretaker,
            None => {
                let caretaker = Caretaker {
                    id: Uuid::new_v4(),
                    family_id,
                    login_id: fallback_login_id.to_string(),
                    display_name: "System".to_string(),
                    role: Role::Admin,
                    pin: pin.to_string(),
                    is_active: true,
                    session_id: None,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                };
                state.caretakers.push(caretaker.clone());
                caretaker
            }
        };

        Ok(BootstrapOutcome { caretaker, settings })
    }
}
