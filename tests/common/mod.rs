//! Test helper module for the integration tests.
//!
//! Builds the real router over the in-memory store so the whole HTTP
//! surface can be exercised without PostgreSQL or SMTP.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::util::ServiceExt;

use qrfood_backend::{
    build_router,
    config::{
        AppConfig, DatabaseConfig, Environment, GoogleConfig, JwtConfig, SecurityConfig,
        SmtpConfig,
    },
    models::{NewUser, User},
    services::{AuthService, JwtCodec, RecordingMailer, StaticVerifier},
    store::{AuthStore, MemoryStore},
    utils::password::{hash_password, Password},
    AppState,
};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Dev,
        service_name: "qrfood-backend-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        port: 0,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
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
            client_id: "test-client-id".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        frontend_url: "http://localhost:3000".to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub jwt: JwtCodec,
    pub auth: AuthService,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with_verifier(StaticVerifier::new())
    }

    pub fn spawn_with_verifier(verifier: StaticVerifier) -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let jwt = JwtCodec::new(&config.jwt);

        let auth = AuthService::new(
            store.clone(),
            mailer.clone(),
            Arc::new(verifier),
            jwt.clone(),
            &config.jwt,
            config.frontend_url.clone(),
        );

        let state = AppState {
            config,
            store: store.clone(),
            jwt: jwt.clone(),
            auth: auth.clone(),
        };

        TestApp {
            router: build_router(state),
            store,
            mailer,
            jwt,
            auth,
        }
    }

    /// Seed a principal with a password.
    pub async fn seed_user(&self, email: &str, password: &str, roles: &[&str]) -> User {
        let hash = hash_password(&Password::new(password.to_string())).expect("hash");
        self.store
            .insert_user(NewUser {
                email: email.to_string(),
                password_hash: Some(hash.into_string()),
                google_id: None,
                roles: roles.iter().map(|r| r.to_string()).collect(),
            })
            .await
            .expect("seed user")
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response")
    }

    pub async fn post_json_authed(
        &self,
        uri: &str,
        token: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response")
    }

    pub async fn get_authed(&self, uri: &str, token: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response")
    }

    /// Log in via the HTTP surface and return the parsed response body.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        eatery_id: Option<i64>,
    ) -> serde_json::Value {
        let response = self
            .post_json(
                "/api/auth/login",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "eateryId": eatery_id,
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn set_cookie_header(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
