use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Caretaker role within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    #[sqlx(rename = "ADMIN")]
    Admin,
    #[serde(rename = "USER")]
    #[sqlx(rename = "USER")]
    User,
}

/// A named login identity within one family.
///
/// `login_id` is unique within the family. The reserved id `"00"` denotes
/// the fallback system caretaker, which exists only as a bootstrap
/// convenience and must never surface as a real person in audit or display
/// contexts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Caretaker {
    pub id: Uuid,
    pub family_id: Uuid,
    pub login_id: String,
    pub display_name: String,
    pub role: Role,
    /// Stored plain by policy; see `auth::secrets`.
    pub pin: String,
    pub is_active: bool,
    /// Legacy session identifier, looked up directly by the cookie
    /// compatibility path.
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
