//! User model - the authentication principal.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Principal entity.
///
/// `roles` holds claim strings such as `EATERY_ADMIN` or `WAITER`; the
/// service carries them into the access token without interpreting them.
/// `password_hash` is None for shell accounts created by a magic-link
/// request for an unknown address; those accounts cannot pass password
/// login until a hash is set.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a new principal; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub roles: Vec<String>,
}
