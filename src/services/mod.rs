pub mod auth;
pub mod email;
pub mod google;
pub mod jwt;

pub use auth::{AuthService, LoginOutcome};
pub use email::{Mailer, RecordingMailer, SmtpMailer};
pub use google::{GoogleVerifier, IdentityVerifier, StaticVerifier, VerifiedIdentity};
pub use jwt::{AccessClaims, JwtCodec};
