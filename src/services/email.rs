use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use std::time::Duration;

use crate::config::SmtpConfig;
use crate::error::AppError;

/// Outbound-mail seam: the orchestrator never touches SMTP directly.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_magic_link_email(
        &self,
        to_email: &str,
        raw_token: &str,
        frontend_url: &str,
    ) -> Result<(), AppError>;

    async fn send_password_reset_email(
        &self,
        to_email: &str,
        raw_token: &str,
        frontend_url: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: SmtpTransport,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized");

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from_address.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .to(to_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(plain_body.to_string())
            .map_err(|e| AppError::InternalError(e.into()))?;

        // Send in the blocking pool to keep the async runtime free
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e.to_string(), to = %to_email, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_magic_link_email(
        &self,
        to_email: &str,
        raw_token: &str,
        frontend_url: &str,
    ) -> Result<(), AppError> {
        let link = format!("{}/auth/verify?token={}", frontend_url, raw_token);
        let body = format!(
            "Sign in to your account\n\nFollow this link to sign in:\n\n{}\n\nThe link expires in 30 minutes. If you didn't request it, ignore this email.",
            link
        );
        self.send_email(to_email, "Your sign-in link", &body).await
    }

    async fn send_password_reset_email(
        &self,
        to_email: &str,
        raw_token: &str,
        frontend_url: &str,
    ) -> Result<(), AppError> {
        let link = format!("{}/auth/password-reset?token={}", frontend_url, raw_token);
        let body = format!(
            "Password reset request\n\nFollow this link to set a new password:\n\n{}\n\nThe link expires in 1 hour. If you didn't request it, ignore this email.",
            link
        );
        self.send_email(to_email, "Reset your password", &body).await
    }
}

/// A sent mail captured by [`RecordingMailer`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub raw_token: String,
    pub kind: SentMailKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentMailKind {
    MagicLink,
    PasswordReset,
}

/// Mailer that records instead of sending; used by the tests.
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn record(&self, mail: SentMail) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail);
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_magic_link_email(
        &self,
        to_email: &str,
        raw_token: &str,
        _frontend_url: &str,
    ) -> Result<(), AppError> {
        self.record(SentMail {
            to: to_email.to_string(),
            raw_token: raw_token.to_string(),
            kind: SentMailKind::MagicLink,
        });
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to_email: &str,
        raw_token: &str,
        _frontend_url: &str,
    ) -> Result<(), AppError> {
        self.record(SentMail {
            to: to_email.to_string(),
            raw_token: raw_token.to_string(),
            kind: SentMailKind::PasswordReset,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smtp_mailer_creation() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            from_address: "no-reply@example.com".to_string(),
        };

        assert!(SmtpMailer::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_recording_mailer_captures_tokens() {
        let mailer = RecordingMailer::new();
        mailer
            .send_magic_link_email("a@example.com", "raw-1", "http://localhost")
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@example.com");
        assert_eq!(sent[0].raw_token, "raw-1");
        assert_eq!(sent[0].kind, SentMailKind::MagicLink);
    }
}
