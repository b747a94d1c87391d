use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Lazily created connection pool shared by the whole process.
///
/// The tracker is a single-database multi-tenant system: every row is scoped
/// by family id, so one pool serves all tenants.
pub struct DatabaseManager {
    pool: Mutex<Option<PgPool>>,
}

impl DatabaseManager {
    fn instance() -> &'static DatabaseManager {
        static INSTANCE: OnceLock<DatabaseManager> = OnceLock::new();
        INSTANCE.get_or_init(|| DatabaseManager { pool: Mutex::new(None) })
    }

    /// Get the shared pool, creating it on first use from DATABASE_URL.
    pub async fn pool() -> Result<PgPool, DatabaseError> {
        let manager = Self::instance();
        let mut guard = manager.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let pool = PgPoolOptions::new().max_connections(10).connect(&url).await?;
        info!("Created database pool");
        *guard = Some(pool.clone());
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }
}
