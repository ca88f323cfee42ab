//! Refresh token model - one active opaque token per principal.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    /// Tenant snapshot taken at login; carried into access tokens minted
    /// through the exchange endpoint.
    pub eatery_id: Option<i64>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
