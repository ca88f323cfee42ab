//! User profile - display data attached one-to-one to a principal.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub name: Option<String>,
    pub locale: Option<String>,
    pub phones: Vec<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
