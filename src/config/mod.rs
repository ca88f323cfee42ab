use crate::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub google: GoogleConfig,
    pub security: SecurityConfig,
    pub frontend_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
    pub magic_link_expiry_minutes: i64,
    pub password_reset_expiry_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AppConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("qrfood-backend"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            database: DatabaseConfig {
                url: get_env(
                    "DATABASE_URL",
                    Some("postgres://localhost/qrfood"),
                    is_prod,
                )?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            jwt: JwtConfig {
                secret: get_env(
                    "JWT_SECRET",
                    Some("dev-only-secret-change-me-0123456789abcdef"),
                    is_prod,
                )?,
                access_token_expiry_minutes: get_env(
                    "JWT_ACCESS_TOKEN_EXPIRY_MINUTES",
                    Some("600"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
                refresh_token_expiry_days: get_env(
                    "JWT_REFRESH_TOKEN_EXPIRY_DAYS",
                    Some("7"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
                magic_link_expiry_minutes: get_env(
                    "MAGIC_LINK_EXPIRY_MINUTES",
                    Some("30"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
                password_reset_expiry_minutes: get_env(
                    "PASSWORD_RESET_EXPIRY_MINUTES",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                port: get_env("SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .unwrap_or(587),
                username: get_env("SMTP_USERNAME", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_address: get_env("SMTP_FROM", Some("no-reply@qrfood.local"), is_prod)?,
            },
            google: GoogleConfig {
                client_id: get_env("GOOGLE_CLIENT_ID", Some(""), is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            },
            frontend_url: get_env("FRONTEND_URL", Some("http://localhost:3000"), is_prod)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.secret.len() < 32 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 bytes"
            )));
        }

        if self.jwt.access_token_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_ACCESS_TOKEN_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.jwt.refresh_token_expiry_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_REFRESH_TOKEN_EXPIRY_DAYS must be positive"
            )));
        }

        if self.jwt.magic_link_expiry_minutes <= 0 || self.jwt.password_reset_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Single-use token expiry minutes must be positive"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_config() -> AppConfig {
        AppConfig {
            environment: Environment::Dev,
            service_name: "qrfood-backend".to_string(),
            service_version: "1.0.0".to_string(),
            log_level: "info".to_string(),
            port: 8080,
            database: DatabaseConfig {
                url: "postgres://localhost/qrfood".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            jwt: JwtConfig {
                secret: "dev-only-secret-change-me-0123456789abcdef".to_string(),
                access_token_expiry_minutes: 600,
                refresh_token_expiry_days: 7,
                magic_link_expiry_minutes: 30,
                password_reset_expiry_minutes: 60,
            },
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                username: String::new(),
                password: String::new(),
                from_address: "no-reply@qrfood.local".to_string(),
            },
            google: GoogleConfig {
                client_id: String::new(),
            },
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            frontend_url: "http://localhost:3000".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_dev_defaults() {
        assert!(dev_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = dev_config();
        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wildcard_origin_in_prod() {
        let mut config = dev_config();
        config.environment = Environment::Prod;
        config.security.allowed_origins = vec!["*".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Dev));
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert!("staging".parse::<Environment>().is_err());
    }
}
