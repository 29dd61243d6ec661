//! school-calendar server entry point.
//!
//! Loads configuration, selects the record store and starts the Axum HTTP
//! server with the REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use school_calendar::api;
use school_calendar::app_state::AppState;
use school_calendar::config::{CalendarConfig, LogFormat};
use school_calendar::domain::RecurrenceExpander;
use school_calendar::persistence::{MemoryStore, PostgresStore, Store};
use school_calendar::service::CalendarService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = CalendarConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting school-calendar");

    // Build persistence layer
    let store = build_store(&config).await?;
    tracing::info!(store = store.kind(), "record store ready");

    // Build service layer
    let expander = RecurrenceExpander::new(config.expansion_max_periods);
    tracing::info!(max_periods = expander.max_periods(), "recurrence expander ready");
    let service = CalendarService::new(Arc::new(store), expander);
    let app_state = AppState::new(service);

    // Build router
    // Layers applied innermost-first: timeout, then trace, then CORS outermost.
    let app = api::build_router()
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_store(config: &CalendarConfig) -> anyhow::Result<Store> {
    if !config.persistence_enabled {
        tracing::warn!("persistence disabled, records live in memory only");
        return Ok(Store::Memory(MemoryStore::new()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("connecting to PostgreSQL")?;
    let store = PostgresStore::new(pool);

    if config.run_migrations {
        store.migrate().await.context("running migrations")?;
        tracing::info!("migrations applied");
    }
    Ok(Store::Postgres(store))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
