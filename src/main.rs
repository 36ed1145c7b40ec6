//! QueryGuard Server
//!
//! Threat classification and risk-based lockout for a monitored
//! database-access platform.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        QUERYGUARD                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────────────────────────────┐   │
//! │  │  API      │  │  Threat Engine                       │   │
//! │  │  (Axum)   │─▶│  classify → resolve → log            │   │
//! │  │           │  │  risk → auto-lock / lock / unlock    │   │
//! │  └───────────┘  └──────────────────┬───────────────────┘   │
//! │                                    ▼                        │
//! │                             ┌─────────────┐                │
//! │                             │ PostgreSQL  │                │
//! │                             └─────────────┘                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod engine;
mod error;
mod handlers;
mod models;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::engine::{RiskPolicy, ThreatEngine};
use crate::store::PgStore;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "queryguard=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("QueryGuard server starting ({})", config.environment);
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    if config.auto_lock_risk_threshold > 100 {
        tracing::warn!(
            "AUTO_LOCK_RISK_THRESHOLD={} exceeds the maximum risk score, auto-lock will never trigger",
            config.auto_lock_risk_threshold
        );
    }

    // Initialize database pool
    let pool = db::create_pool(&config.database_url)
        .await
        .context("failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let engine = ThreatEngine::new(
        Arc::new(PgStore::new(pool)),
        RiskPolicy::new(config.auto_lock_risk_threshold),
    );

    for category in engine.missing_routines().await? {
        tracing::warn!(category = %category, "No handler routine configured");
    }

    // Build application state
    let state = AppState {
        engine: Arc::new(engine),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid API_HOST/API_PORT")?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ThreatEngine>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Roles
        .route("/api/v1/roles", get(handlers::roles::list))

        // Users and lock state
        .route("/api/v1/users", get(handlers::users::list))
        .route("/api/v1/users", post(handlers::users::create))
        .route("/api/v1/users/lock-high-risk", post(handlers::users::lock_high_risk))
        .route("/api/v1/users/:id/lock", post(handlers::users::lock))
        .route("/api/v1/users/:id/unlock", post(handlers::users::unlock))

        // Audit log
        .route("/api/v1/logs", get(handlers::logs::list))
        .route("/api/v1/logs", post(handlers::logs::submit))

        // Handler routines
        .route("/api/v1/handler-routines", get(handlers::routines::list))
        .route("/api/v1/handler-routines/stats", get(handlers::routines::stats));

    let cors = if state.config.is_production() {
        CorsLayer::new()
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
