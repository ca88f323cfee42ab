//! Persistence seam for the authentication flows.
//!
//! The orchestrator only ever talks to [`AuthStore`]; the Postgres
//! implementation backs the running service and the in-memory one backs
//! the integration tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{EateryMember, LoginToken, NewUser, RefreshToken, User, UserProfile};

#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Ping the backing store.
    async fn health_check(&self) -> Result<(), AppError>;

    // Principals
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError>;
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn link_google_id(&self, user_id: i64, google_id: &str) -> Result<(), AppError>;
    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError>;

    // Profiles
    async fn profile_for(&self, user_id: i64) -> Result<Option<UserProfile>, AppError>;
    async fn upsert_profile_name(&self, user_id: i64, name: &str) -> Result<(), AppError>;
    async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AppError>;

    // Memberships
    async fn eatery_ids_for(&self, user_id: i64) -> Result<Vec<i64>, AppError>;
    async fn staff_for_eatery(&self, eatery_id: i64) -> Result<Vec<EateryMember>, AppError>;

    // Refresh tokens: at most one active row per principal. Replacement
    // deletes any existing row and inserts the new one atomically.
    async fn replace_refresh_token(
        &self,
        user_id: i64,
        token: &str,
        eatery_id: Option<i64>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError>;
    async fn delete_refresh_token(&self, id: i64) -> Result<(), AppError>;
    async fn delete_refresh_tokens_for_user(&self, user_id: i64) -> Result<(), AppError>;

    // Single-use login tokens, keyed by SHA-256 of the raw secret.
    async fn insert_login_token(
        &self,
        user_id: i64,
        token_hash: &str,
        kind: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
    /// Atomically remove and return the token row for `token_hash`.
    /// The row is gone whatever the caller decides about expiry or kind.
    async fn take_login_token(&self, token_hash: &str) -> Result<Option<LoginToken>, AppError>;
}
