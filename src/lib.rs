pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::{AuthService, JwtCodec};
use crate::store::AuthStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn AuthStore>,
    pub jwt: JwtCodec,
    pub auth: AuthService,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .filter_map(|o| {
                    o.parse::<HeaderValue>()
                        .map_err(|e| {
                            tracing::error!("Invalid CORS origin '{}': {}", o, e);
                            e
                        })
                        .ok()
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/magic-link", post(handlers::auth::magic_link))
        .route("/api/auth/verify-token", post(handlers::auth::verify_token))
        .route("/api/auth/oauth/google", post(handlers::auth::google_oauth))
        .route(
            "/api/auth/password-reset/request",
            post(handlers::auth::password_reset_request),
        )
        .route(
            "/api/auth/password-reset/complete",
            post(handlers::auth::password_reset_complete),
        )
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/api/auth/refresh-token",
            post(handlers::auth::refresh_token),
        )
        .route("/api/auth/status", get(handlers::auth::status))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/eatery/:eatery_id/staff", get(handlers::staff::list_staff))
        // Layers run outside-in: authenticate first, then the tenant guard
        .layer(from_fn(middleware::eatery_guard_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::authenticate_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Service health check
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}
