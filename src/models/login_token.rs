//! Single-use login tokens (magic links, password resets).
//!
//! Only the SHA-256 of the raw secret is persisted; consumption is an
//! atomic delete-and-return, so a secret can never be presented twice.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    MagicLink,
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::MagicLink => "magic_link",
            TokenKind::PasswordReset => "password_reset",
        }
    }
}

impl std::str::FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "magic_link" => Ok(TokenKind::MagicLink),
            "password_reset" => Ok(TokenKind::PasswordReset),
            _ => Err(format!("Unknown token kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LoginToken {
    pub id: i64,
    pub token_hash: String,
    pub user_id: i64,
    pub kind: String,
    pub expires_at: DateTime<Utc>,
}

impl LoginToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
