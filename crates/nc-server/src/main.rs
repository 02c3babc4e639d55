//! NC Ops server
//!
//! Serves the JSON API and health probes. Without a reachable database the
//! server still starts, on in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nc_api::AppState;
use nc_audit::AuditService;
use nc_auth::{Authenticator, MemorySessionStore};
use nc_core::config::{AppConfig, LogFormat};
use nc_db::{Database, DatabaseConfig, Stores};
use nc_notifications::{build_sender, DisabledEmailSender, EmailSender, Notifier};
use nc_services::{ServiceContext, Services};
use nc_summaries::GroqClient;

mod health;

use health::{HealthChecker, HealthConfig};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(config.instance.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting {}",
        config.instance.app_title
    );

    let db = match Database::connect(&DatabaseConfig::from(&config)).await {
        Ok(db) => {
            db.migrate().await.context("failed to apply database migrations")?;
            info!("Connected to database");
            Some(db)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to database, running on in-memory stores");
            None
        }
    };
    let stores = db.as_ref().map(Stores::postgres).unwrap_or_else(Stores::memory);

    let sender: Arc<dyn EmailSender> = build_sender(&config.email).unwrap_or_else(|e| {
        warn!(error = %e, "Email delivery unavailable, notifications disabled");
        Arc::new(DisabledEmailSender)
    });
    if config.llm.api_key.is_none() {
        warn!("GROQ_API_KEY is not set, AI summaries will fail");
    }

    let config = Arc::new(config);
    let (app_state, notifier) = build_state(stores, sender, config.clone());
    let health = HealthChecker::new(HealthConfig::default())
        .with_database(db.clone())
        .with_email(notifier.is_enabled())
        .with_llm(config.llm.api_key.is_some());

    spawn_session_sweeper(app_state.authenticator.clone());
    let app = build_router(app_state, Arc::new(health));

    let addr = config.server_addr();
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = db {
        db.close().await;
    }
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,nc_server=debug,nc_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
    }
}

/// Wire stores, notifications, the LLM client and sessions into API state
fn build_state(stores: Stores, sender: Arc<dyn EmailSender>, config: Arc<AppConfig>) -> (AppState, Notifier) {
    let audit = Arc::new(AuditService::new(stores.audit.clone()));
    let notifier = Notifier::new(sender, &config.email, audit.clone());
    let ctx = ServiceContext::new(stores, audit, notifier.clone(), config.clone());
    let services = Services::new(ctx, Arc::new(GroqClient::new(&config.llm)));
    let authenticator = Authenticator::new(Arc::new(MemorySessionStore::new()), &config.auth);
    (AppState::new(services, authenticator, config), notifier)
}

fn build_router(state: AppState, health: Arc<HealthChecker>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(health);

    Router::new()
        .merge(health_routes)
        .merge(nc_api::router().with_state(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// Drop idle-expired sessions so the store does not grow unbounded
fn spawn_session_sweeper(authenticator: Authenticator) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = authenticator.cleanup_expired();
            if removed > 0 {
                debug!(removed, "Expired sessions removed");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
