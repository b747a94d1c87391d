//! Narrow storage seam consumed by the authorization core.
//!
//! The core only ever needs point lookups scoped to a family, a caretaker
//! count, and one transactional create for bootstrap. Handlers never talk
//! to the database directly for auth decisions.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Caretaker, Family, FamilySettings, Role};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// New fallback caretaker + settings created together during bootstrap.
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    pub caretaker: Caretaker,
    pub settings: FamilySettings,
}

#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_family_by_slug(&self, slug: &str) -> Result<Option<Family>, StoreError>;

    async fn find_family_by_id(&self, id: Uuid) -> Result<Option<Family>, StoreError>;

    /// Lookup a caretaker by its short login identifier within one family.
    /// Soft-deleted caretakers are excluded.
    async fn find_caretaker_by_login(
        &self,
        family_id: Uuid,
        login_id: &str,
    ) -> Result<Option<Caretaker>, StoreError>;

    async fn find_caretaker_by_id(&self, id: Uuid) -> Result<Option<Caretaker>, StoreError>;

    /// Legacy cookie path: resolve a session identifier directly to its
    /// caretaker.
    async fn find_caretaker_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Caretaker>, StoreError>;

    /// Count caretakers whose login id is not the reserved fallback id.
    /// Soft-deleted rows do not count.
    async fn count_real_caretakers(&self, family_id: Uuid) -> Result<i64, StoreError>;

    async fn get_settings(&self, family_id: Uuid) -> Result<Option<FamilySettings>, StoreError>;

    /// Atomically materialize the fallback caretaker and, if absent, the
    /// settings row. `security_pin_hash` is the argon2 hash to store when
    /// settings must be created; `pin` is the plain secret bound to the
    /// fallback caretaker.
    async fn bootstrap_fallback(
        &self,
        family_id: Uuid,
        fallback_login_id: &str,
        pin: &str,
        security_pin_hash: &str,
    ) -> Result<BootstrapOutcome, StoreError>;
}

/// Postgres-backed store.
pub struct PgAuthStore {
    pool: sqlx::PgPool,
}

impl PgAuthStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn find_family_by_slug(&self, slug: &str) -> Result<Option<Family>, StoreError> {
        let family = sqlx::query_as::<_, Family>(
            r#"
            SELECT id, slug, name, is_active, created_at, updated_at
            FROM families
            WHERE slug = $1 AND is_active = true
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(family)
    }

    async fn find_family_by_id(&self, id: Uuid) -> Result<Option<Family>, StoreError> {
        let family = sqlx::query_as::<_, Family>(
            r#"
            SELECT id, slug, name, is_active, created_at, updated_at
            FROM families
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(family)
    }

    async fn find_caretaker_by_login(
        &self,
        family_id: Uuid,
        login_id: &str,
    ) -> Result<Option<Caretaker>, StoreError> {
        let caretaker = sqlx::query_as::<_, Caretaker>(
            r#"
            SELECT id, family_id, login_id, display_name, role, pin,
                   is_active, session_id, created_at, updated_at, deleted_at
            FROM caretakers
            WHERE family_id = $1 AND login_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(family_id)
        .bind(login_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(caretaker)
    }

    async fn find_caretaker_by_id(&self, id: Uuid) -> Result<Option<Caretaker>, StoreError> {
        let caretaker = sqlx::query_as::<_, Caretaker>(
            r#"
            SELECT id, family_id, login_id, display_name, role, pin,
                   is_active, session_id, created_at, updated_at, deleted_at
            FROM caretakers
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(caretaker)
    }

    async fn find_caretaker_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Caretaker>, StoreError> {
        let caretaker = sqlx::query_as::<_, Caretaker>(
            r#"
            SELECT id, family_id, login_id, display_name, role, pin,
                   is_active, session_id, created_at, updated_at, deleted_at
            FROM caretakers
            WHERE session_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(caretaker)
    }

    async fn count_real_caretakers(&self, family_id: Uuid) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM caretakers
            WHERE family_id = $1 AND login_id <> $2 AND deleted_at IS NULL
            "#,
        )
        .bind(family_id)
        .bind(crate::auth::FALLBACK_LOGIN_ID)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }

    async fn get_settings(&self, family_id: Uuid) -> Result<Option<FamilySettings>, StoreError> {
        let settings = sqlx::query_as::<_, FamilySettings>(
            r#"
            SELECT id, family_id, security_pin, timezone, created_at, updated_at
            FROM family_settings
            WHERE family_id = $1
            "#,
        )
        .bind(family_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(settings)
    }

    async fn bootstrap_fallback(
        &self,
        family_id: Uuid,
        fallback_login_id: &str,
        pin: &str,
        security_pin_hash: &str,
    ) -> Result<BootstrapOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let settings = match sqlx::query_as::<_, FamilySettings>(
            r#"
            SELECT id, family_id, security_pin, timezone, created_at, updated_at
            FROM family_settings
            WHERE family_id = $1
            FOR UPDATE
            "#,
        )
        .bind(family_id)
        .fetch_optional(&mut *tx)
        .await?
        {
            Some(settings) => settings,
            None => {
                sqlx::query_as::<_, FamilySettings>(
                    r#"
                    INSERT INTO family_settings (id, family_id, security_pin, timezone, created_at, updated_at)
                    VALUES ($1, $2, $3, 'UTC', now(), now())
                    RETURNING id, family_id, security_pin, timezone, created_at, updated_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(family_id)
                .bind(security_pin_hash)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let caretaker = match sqlx::query_as::<_, Caretaker>(
            r#"
            SELECT id, family_id, login_id, display_name, role, pin,
                   is_active, session_id, created_at, updated_at, deleted_at
            FROM caretakers
            WHERE family_id = $1 AND login_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(family_id)
        .bind(fallback_login_id)
        .fetch_optional(&mut *tx)
        .await?
        {
            Some(caretaker) => caretaker,
            None => {
                sqlx::query_as::<_, Caretaker>(
                    r#"
                    INSERT INTO caretakers
                        (id, family_id, login_id, display_name, role, pin,
                         is_active, session_id, created_at, updated_at, deleted_at)
                    VALUES ($1, $2, $3, 'System', $4, $5, true, NULL, now(), now(), NULL)
                    RETURNING id, family_id, login_id, display_name, role, pin,
                              is_active, session_id, created_at, updated_at, deleted_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(family_id)
                .bind(fallback_login_id)
                .bind(Role::Admin)
                .bind(pin)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(BootstrapOutcome { caretaker, settings })
    }
}
