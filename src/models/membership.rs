//! Eatery membership - maps a principal to the eateries it may act in.

use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct EateryMember {
    pub id: i64,
    pub user_id: i64,
    pub eatery_id: i64,
    pub role: String,
}
