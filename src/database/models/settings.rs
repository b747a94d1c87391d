use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-family configuration row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FamilySettings {
    pub id: Uuid,
    pub family_id: Uuid,
    /// Shared fallback secret ("security PIN"), argon2-hashed at rest. Only
    /// consulted while the family has zero real caretakers.
    pub security_pin: String,
    /// Display timezone, part of the documented bootstrap defaults.
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
