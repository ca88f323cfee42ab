use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GoogleConfig;
use crate::error::AppError;

/// Identity asserted by the external provider after verifying an ID token.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Provider-scoped stable subject id.
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

/// Token-verification seam. Verification of provider credentials is fully
/// delegated here; the orchestrator only sees the asserted identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, raw_id_token: &str) -> Result<VerifiedIdentity, AppError>;
}

/// Google `tokeninfo` verifier.
#[derive(Clone)]
pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: String,
    name: Option<String>,
}

impl GoogleVerifier {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, raw_id_token: &str) -> Result<VerifiedIdentity, AppError> {
        let info: TokenInfo = self
            .client
            .get("https://oauth2.googleapis.com/tokeninfo")
            .query(&[("id_token", raw_id_token)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Google tokeninfo request failed");
                AppError::TokenInvalid
            })?
            .error_for_status()
            .map_err(|_| AppError::TokenInvalid)?
            .json()
            .await
            .map_err(|_| AppError::TokenInvalid)?;

        // A token minted for another client is not ours to accept
        if info.aud != self.client_id {
            tracing::warn!(aud = %info.aud, "Google token audience mismatch");
            return Err(AppError::TokenInvalid);
        }

        Ok(VerifiedIdentity {
            subject: info.sub,
            email: info.email,
            name: info.name,
        })
    }
}

/// Verifier with a fixed token table; used by the tests.
#[derive(Default)]
pub struct StaticVerifier {
    identities: std::collections::HashMap<String, VerifiedIdentity>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, raw_token: &str, identity: VerifiedIdentity) -> Self {
        self.identities.insert(raw_token.to_string(), identity);
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, raw_id_token: &str) -> Result<VerifiedIdentity, AppError> {
        self.identities
            .get(raw_id_token)
            .cloned()
            .ok_or(AppError::TokenInvalid)
    }
}
