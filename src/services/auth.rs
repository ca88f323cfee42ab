//! Hybrid login orchestrator.
//!
//! Every login flow (password, magic link, Google) funnels into
//! [`AuthService::complete_login`], which mints the access token and
//! hard-replaces the principal's refresh token.

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::dtos::auth::{
    LoginRequest, LoginResponse, StaffMemberResponse, StatusResponse, TokenResponse,
};
use crate::error::AppError;
use crate::models::{NewUser, TokenKind, User};
use crate::services::email::Mailer;
use crate::services::google::IdentityVerifier;
use crate::services::jwt::{AccessClaims, JwtCodec};
use crate::store::AuthStore;
use crate::utils::hash::sha256_hex;
use crate::utils::password::{hash_password, verify_password, Password, PasswordHashString};

/// Result of a completed login: the response body plus the raw refresh
/// token the handler puts into the cookie.
pub struct LoginOutcome {
    pub response: LoginResponse,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AuthStore>,
    mailer: Arc<dyn Mailer>,
    identity: Arc<dyn IdentityVerifier>,
    jwt: JwtCodec,
    refresh_token_expiry_days: i64,
    magic_link_expiry_minutes: i64,
    password_reset_expiry_minutes: i64,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AuthStore>,
        mailer: Arc<dyn Mailer>,
        identity: Arc<dyn IdentityVerifier>,
        jwt: JwtCodec,
        jwt_config: &JwtConfig,
        frontend_url: String,
    ) -> Self {
        Self {
            store,
            mailer,
            identity,
            jwt,
            refresh_token_expiry_days: jwt_config.refresh_token_expiry_days,
            magic_link_expiry_minutes: jwt_config.magic_link_expiry_minutes,
            password_reset_expiry_minutes: jwt_config.password_reset_expiry_minutes,
            frontend_url,
        }
    }

    pub fn refresh_cookie_max_age_seconds(&self) -> i64 {
        self.refresh_token_expiry_days * 24 * 60 * 60
    }

    // ==================== Login flows ====================

    pub async fn password_login(&self, req: LoginRequest) -> Result<LoginOutcome, AppError> {
        let user = self
            .store
            .find_user_by_email(&req.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Shell accounts have no hash and cannot pass password login
        let stored_hash = user
            .password_hash
            .clone()
            .ok_or(AppError::InvalidCredentials)?;

        verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(stored_hash),
        )
        .map_err(|_| AppError::InvalidCredentials)?;

        let eatery_id = self.resolve_eatery(user.id, req.eatery_id).await?;

        tracing::info!(
            user_id = user.id,
            email = %user.email,
            eatery_id = ?eatery_id,
            "Password login"
        );

        self.complete_login(user, eatery_id).await
    }

    pub async fn request_magic_link(&self, email: &str) -> Result<(), AppError> {
        match self.store.find_user_by_email(email).await? {
            Some(user) => {
                let raw = self
                    .create_login_token(
                        user.id,
                        TokenKind::MagicLink,
                        self.magic_link_expiry_minutes,
                    )
                    .await?;
                self.mailer
                    .send_magic_link_email(&user.email, &raw, &self.frontend_url)
                    .await?;
                tracing::info!(user_id = user.id, "Magic link issued");
            }
            None => {
                // Unknown address: create a shell principal so the eatery
                // can attach it later; no mail goes out.
                let user = self
                    .store
                    .insert_user(NewUser {
                        email: email.to_string(),
                        password_hash: None,
                        google_id: None,
                        roles: vec![],
                    })
                    .await?;
                tracing::info!(user_id = user.id, "Shell principal created for magic link");
            }
        }
        Ok(())
    }

    pub async fn verify_magic_link(&self, raw_token: &str) -> Result<LoginOutcome, AppError> {
        let user_id = self
            .consume_login_token(raw_token, TokenKind::MagicLink)
            .await?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

        tracing::info!(user_id = user.id, "Magic link verified");

        // Magic-link sessions start tenant-less
        self.complete_login(user, None).await
    }

    pub async fn google_login(&self, raw_id_token: &str) -> Result<LoginOutcome, AppError> {
        let identity = self.identity.verify(raw_id_token).await?;

        // Resolution order: subject id, then email link, then create
        let user = match self.store.find_user_by_google_id(&identity.subject).await? {
            Some(user) => user,
            None => match self.store.find_user_by_email(&identity.email).await? {
                Some(user) => {
                    self.store.link_google_id(user.id, &identity.subject).await?;
                    if let Some(name) = &identity.name {
                        self.store.upsert_profile_name(user.id, name).await?;
                    }
                    tracing::info!(user_id = user.id, "Linked Google identity to existing principal");
                    self.store
                        .find_user_by_id(user.id)
                        .await?
                        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?
                }
                None => {
                    let user = self
                        .store
                        .insert_user(NewUser {
                            email: identity.email.clone(),
                            password_hash: None,
                            google_id: Some(identity.subject.clone()),
                            roles: vec![],
                        })
                        .await?;
                    if let Some(name) = &identity.name {
                        self.store.upsert_profile_name(user.id, name).await?;
                    }
                    tracing::info!(user_id = user.id, "Created principal from Google identity");
                    user
                }
            },
        };

        self.complete_login(user, None).await
    }

    // ==================== Password reset ====================

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        // Unknown addresses are silently ignored; the response never
        // reveals whether the account exists.
        if let Some(user) = self.store.find_user_by_email(email).await? {
            let raw = self
                .create_login_token(
                    user.id,
                    TokenKind::PasswordReset,
                    self.password_reset_expiry_minutes,
                )
                .await?;
            self.mailer
                .send_password_reset_email(&user.email, &raw, &self.frontend_url)
                .await?;
            tracing::info!(user_id = user.id, "Password reset requested");
        }
        Ok(())
    }

    pub async fn complete_password_reset(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user_id = self
            .consume_login_token(raw_token, TokenKind::PasswordReset)
            .await?;

        let hash = hash_password(&Password::new(new_password.to_string()))?;
        self.store
            .update_password(user_id, hash.as_str())
            .await?;

        tracing::info!(user_id = user_id, "Password reset completed");
        Ok(())
    }

    // ==================== Token maintenance ====================

    /// Re-issue an access token for a new tenant scope.
    pub async fn switch_tenant(
        &self,
        claims: &AccessClaims,
        requested: Option<i64>,
    ) -> Result<TokenResponse, AppError> {
        let user = self
            .store
            .find_user_by_id(claims.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

        // A principal that has never completed a login has no profile row
        self.store
            .profile_for(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User profile not found")))?;

        let eatery_id = match requested {
            Some(id) => {
                let memberships = self.store.eatery_ids_for(user.id).await?;
                if !memberships.contains(&id) {
                    return Err(AppError::Forbidden(anyhow::anyhow!(
                        "Not a member of eatery {}",
                        id
                    )));
                }
                Some(id)
            }
            None => None,
        };

        tracing::info!(user_id = user.id, eatery_id = ?eatery_id, "Tenant switch");

        let token = self.jwt.issue(&user, eatery_id)?;
        Ok(TokenResponse { token, eatery_id })
    }

    /// Exchange an opaque refresh token for a fresh access token carrying
    /// the tenant snapshot stored at login.
    pub async fn exchange_refresh_token(&self, raw: &str) -> Result<TokenResponse, AppError> {
        let row = self
            .store
            .find_refresh_token(raw)
            .await?
            .ok_or(AppError::RefreshTokenNotFound)?;

        if row.is_expired() {
            self.store.delete_refresh_token(row.id).await?;
            return Err(AppError::RefreshTokenExpired);
        }

        let user = self
            .store
            .find_user_by_id(row.user_id)
            .await?
            .ok_or(AppError::RefreshTokenNotFound)?;

        let token = self.jwt.issue(&user, row.eatery_id)?;
        Ok(TokenResponse {
            token,
            eatery_id: row.eatery_id,
        })
    }

    pub async fn logout(&self, claims: &AccessClaims) -> Result<(), AppError> {
        self.store
            .delete_refresh_tokens_for_user(claims.user_id)
            .await?;
        tracing::info!(user_id = claims.user_id, "Logout");
        Ok(())
    }

    pub async fn status(&self, claims: Option<&AccessClaims>) -> Result<StatusResponse, AppError> {
        let Some(claims) = claims else {
            return Ok(StatusResponse::anonymous());
        };

        let Some(user) = self.store.find_user_by_id(claims.user_id).await? else {
            return Ok(StatusResponse::anonymous());
        };

        let profile = self.store.profile_for(user.id).await?;
        let eatery_ids = self.store.eatery_ids_for(user.id).await?;

        Ok(StatusResponse {
            authenticated: true,
            principal_id: Some(user.id),
            username: Some(user.email),
            roles: Some(user.roles),
            eatery_ids: Some(eatery_ids),
            phones: profile.as_ref().map(|p| p.phones.clone()),
            is_active: profile.as_ref().map(|p| p.is_active),
            last_login: profile.as_ref().and_then(|p| p.last_login),
        })
    }

    // ==================== Staff listing ====================

    pub async fn staff_listing(
        &self,
        eatery_id: i64,
    ) -> Result<Vec<StaffMemberResponse>, AppError> {
        let members = self.store.staff_for_eatery(eatery_id).await?;
        let mut staff = Vec::with_capacity(members.len());
        for member in members {
            let email = self
                .store
                .find_user_by_id(member.user_id)
                .await?
                .map(|u| u.email)
                .unwrap_or_default();
            staff.push(StaffMemberResponse {
                principal_id: member.user_id,
                email,
                role: member.role,
            });
        }
        Ok(staff)
    }

    // ==================== Internals ====================

    /// Keep a requested tenant only if the principal is a member;
    /// with nothing requested, default to the sole membership if there
    /// is exactly one.
    async fn resolve_eatery(
        &self,
        user_id: i64,
        requested: Option<i64>,
    ) -> Result<Option<i64>, AppError> {
        let memberships = self.store.eatery_ids_for(user_id).await?;
        Ok(match requested {
            Some(id) if memberships.contains(&id) => Some(id),
            Some(_) => None,
            None if memberships.len() == 1 => Some(memberships[0]),
            None => None,
        })
    }

    async fn complete_login(
        &self,
        user: User,
        eatery_id: Option<i64>,
    ) -> Result<LoginOutcome, AppError> {
        self.store.record_login(user.id, Utc::now()).await?;

        let token = self.jwt.issue(&user, eatery_id)?;

        let refresh_token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(self.refresh_token_expiry_days);
        self.store
            .replace_refresh_token(user.id, &refresh_token, eatery_id, expires_at)
            .await?;

        Ok(LoginOutcome {
            response: LoginResponse {
                token,
                principal_id: user.id,
                username: user.email,
                roles: user.roles,
                eatery_id,
            },
            refresh_token,
        })
    }

    async fn create_login_token(
        &self,
        user_id: i64,
        kind: TokenKind,
        ttl_minutes: i64,
    ) -> Result<String, AppError> {
        let raw = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
        self.store
            .insert_login_token(user_id, &sha256_hex(&raw), kind.as_str(), expires_at)
            .await?;
        Ok(raw)
    }

    /// Burn the presented secret, then check expiry and kind. The row is
    /// gone before either check, so a secret is spent on first contact.
    async fn consume_login_token(
        &self,
        raw: &str,
        expected: TokenKind,
    ) -> Result<i64, AppError> {
        let row = self
            .store
            .take_login_token(&sha256_hex(raw))
            .await?
            .ok_or(AppError::TokenNotFound)?;

        if row.is_expired() {
            return Err(AppError::TokenExpired);
        }
        if row.kind != expected.as_str() {
            return Err(AppError::TokenKindMismatch);
        }
        Ok(row.user_id)
    }
}
