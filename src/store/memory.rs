//! In-memory implementation of the auth store.
//!
//! Backs the integration tests so the whole router can be exercised
//! without PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use crate::error::AppError;
use crate::models::{EateryMember, LoginToken, NewUser, RefreshToken, User, UserProfile};
use crate::store::AuthStore;

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: Vec<User>,
    profiles: Vec<UserProfile>,
    members: Vec<EateryMember>,
    refresh_tokens: Vec<RefreshToken>,
    login_tokens: Vec<LoginToken>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("store mutex poisoned")))
    }

    /// Add an eatery membership (test seeding).
    pub fn add_membership(&self, user_id: i64, eatery_id: i64, role: &str) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        let id = inner.next_id();
        inner.members.push(EateryMember {
            id,
            user_id,
            eatery_id,
            role: role.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let inner = self.lock()?;
        Ok(inner.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .iter()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.lock()?;
        let id = inner.next_id();
        let now = Utc::now();
        let user = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            google_id: user.google_id,
            roles: user.roles,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn link_google_id(&self, user_id: i64, google_id: &str) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) {
            user.google_id = Some(google_id.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = Some(password_hash.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn profile_for(&self, user_id: i64) -> Result<Option<UserProfile>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn upsert_profile_name(&self, user_id: i64, name: &str) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        if let Some(profile) = inner.profiles.iter_mut().find(|p| p.user_id == user_id) {
            profile.name = Some(name.to_string());
            profile.updated_at = Utc::now();
            return Ok(());
        }
        let id = inner.next_id();
        let now = Utc::now();
        inner.profiles.push(UserProfile {
            id,
            user_id,
            name: Some(name.to_string()),
            locale: None,
            phones: vec![],
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn record_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        if let Some(profile) = inner.profiles.iter_mut().find(|p| p.user_id == user_id) {
            profile.last_login = Some(at);
            profile.updated_at = Utc::now();
            return Ok(());
        }
        let id = inner.next_id();
        let now = Utc::now();
        inner.profiles.push(UserProfile {
            id,
            user_id,
            name: None,
            locale: None,
            phones: vec![],
            is_active: true,
            last_login: Some(at),
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn eatery_ids_for(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let inner = self.lock()?;
        let mut ids: Vec<i64> = inner
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.eatery_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn staff_for_eatery(&self, eatery_id: i64) -> Result<Vec<EateryMember>, AppError> {
        let inner = self.lock()?;
        let mut staff: Vec<EateryMember> = inner
            .members
            .iter()
            .filter(|m| m.eatery_id == eatery_id)
            .cloned()
            .collect();
        staff.sort_by_key(|m| m.user_id);
        Ok(staff)
    }

    async fn replace_refresh_token(
        &self,
        user_id: i64,
        token: &str,
        eatery_id: Option<i64>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        inner.refresh_tokens.retain(|t| t.user_id != user_id);
        let id = inner.next_id();
        inner.refresh_tokens.push(RefreshToken {
            id,
            user_id,
            token: token.to_string(),
            eatery_id,
            expires_at,
        });
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .refresh_tokens
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn delete_refresh_token(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        inner.refresh_tokens.retain(|t| t.id != id);
        Ok(())
    }

    async fn delete_refresh_tokens_for_user(&self, user_id: i64) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        inner.refresh_tokens.retain(|t| t.user_id != user_id);
        Ok(())
    }

    async fn insert_login_token(
        &self,
        user_id: i64,
        token_hash: &str,
        kind: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        let id = inner.next_id();
        inner.login_tokens.push(LoginToken {
            id,
            token_hash: token_hash.to_string(),
            user_id,
            kind: kind.to_string(),
            expires_at,
        });
        Ok(())
    }

    async fn take_login_token(&self, token_hash: &str) -> Result<Option<LoginToken>, AppError> {
        let mut inner = self.lock()?;
        let pos = inner
            .login_tokens
            .iter()
            .position(|t| t.token_hash == token_hash);
        Ok(pos.map(|i| inner.login_tokens.remove(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: None,
            google_id: None,
            roles: vec![],
        }
    }

    #[tokio::test]
    async fn test_replace_refresh_token_invalidates_previous() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@example.com")).await.unwrap();

        let expiry = Utc::now() + Duration::days(7);
        store
            .replace_refresh_token(user.id, "first", None, expiry)
            .await
            .unwrap();
        store
            .replace_refresh_token(user.id, "second", Some(3), expiry)
            .await
            .unwrap();

        assert!(store.find_refresh_token("first").await.unwrap().is_none());
        let current = store.find_refresh_token("second").await.unwrap().unwrap();
        assert_eq!(current.eatery_id, Some(3));
    }

    #[tokio::test]
    async fn test_take_login_token_is_single_use() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("b@example.com")).await.unwrap();
        store
            .insert_login_token(
                user.id,
                "hash",
                "magic_link",
                Utc::now() + Duration::minutes(30),
            )
            .await
            .unwrap();

        assert!(store.take_login_token("hash").await.unwrap().is_some());
        assert!(store.take_login_token("hash").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        store.insert_user(new_user("Mixed@Example.com")).await.unwrap();
        assert!(store
            .find_user_by_email("mixed@example.com")
            .await
            .unwrap()
            .is_some());
    }
}
