//! PostgreSQL implementation of the auth store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::error::AppError;
use crate::models::{EateryMember, LoginToken, NewUser, RefreshToken, User, UserProfile};
use crate::store::AuthStore;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE google_id = $1")
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, google_id, roles)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.google_id)
        .bind(&user.roles)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn link_google_id(&self, user_id: i64, google_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET google_id = $1, updated_at = now() WHERE id = $2")
            .bind(google_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn profile_for(&self, user_id: i64) -> Result<Option<UserProfile>, AppError> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn upsert_profile_name(&self, user_id: i64, name: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, name)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET name = EXCLUDED.name, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, last_login)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET last_login = EXCLUDED.last_login, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn eatery_ids_for(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT eatery_id FROM eatery_members WHERE user_id = $1 ORDER BY eatery_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn staff_for_eatery(&self, eatery_id: i64) -> Result<Vec<EateryMember>, AppError> {
        sqlx::query_as::<_, EateryMember>(
            "SELECT * FROM eatery_members WHERE eatery_id = $1 ORDER BY user_id",
        )
        .bind(eatery_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn replace_refresh_token(
        &self,
        user_id: i64,
        token: &str,
        eatery_id: Option<i64>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, eatery_id, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(eatery_id)
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn delete_refresh_token(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn delete_refresh_tokens_for_user(&self, user_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn insert_login_token(
        &self,
        user_id: i64,
        token_hash: &str,
        kind: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO login_tokens (user_id, token_hash, kind, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(kind)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn take_login_token(&self, token_hash: &str) -> Result<Option<LoginToken>, AppError> {
        // DELETE ... RETURNING makes consumption atomic under concurrent
        // presentations of the same secret.
        sqlx::query_as::<_, LoginToken>(
            "DELETE FROM login_tokens WHERE token_hash = $1 RETURNING *",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }
}
