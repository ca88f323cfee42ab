use qrfood_backend::{
    build_router,
    config::AppConfig,
    services::{AuthService, GoogleVerifier, JwtCodec, SmtpMailer},
    store::PgStore,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), qrfood_backend::error::AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting QR-food backend"
    );

    let pool = qrfood_backend::db::connect(&config.database)
        .await
        .map_err(|e| qrfood_backend::error::AppError::DatabaseError(anyhow::anyhow!(e)))?;
    qrfood_backend::db::migrate(&pool)
        .await
        .map_err(|e| qrfood_backend::error::AppError::DatabaseError(anyhow::anyhow!(e)))?;

    let store = Arc::new(PgStore::new(pool));
    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
    let google = Arc::new(GoogleVerifier::new(&config.google));
    let jwt = JwtCodec::new(&config.jwt);

    let auth = AuthService::new(
        store.clone(),
        mailer,
        google,
        jwt.clone(),
        &config.jwt,
        config.frontend_url.clone(),
    );

    let state = AppState {
        config: config.clone(),
        store,
        jwt,
        auth,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
