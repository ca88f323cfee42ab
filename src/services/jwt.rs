use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::AppError;
use crate::models::User;

/// Access-token codec: HS256 with a shared secret from config.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
}

/// Claims carried by access tokens.
///
/// `sub` is the login email; `eatery_id` is the tenant the token is
/// scoped to, absent for tenant-less sessions (magic link, Google).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub roles: Vec<String>,
    #[serde(rename = "eateryId", skip_serializing_if = "Option::is_none")]
    pub eatery_id: Option<i64>,
    pub iat: i64,
    pub exp: i64,
}

impl JwtCodec {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
        }
    }

    /// Mint an access token for a principal, scoped to `eatery_id`.
    pub fn issue(&self, user: &User, eatery_id: Option<i64>) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessClaims {
            sub: user.email.clone(),
            user_id: user.id,
            roles: user.roles.clone(),
            eatery_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode token: {}", e)))
    }

    /// Decode and verify an access token.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::TokenInvalid,
            })
    }

    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }
}
