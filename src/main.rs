//! eventum-api server entry point.
//!
//! Loads configuration, opens the record store and serves the REST API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use eventum_api::api;
use eventum_api::app_state::AppState;
use eventum_api::config::{LogFormat, ServiceConfig};
use eventum_api::persistence::RecordStore;
use eventum_api::persistence::memory::MemoryStore;
use eventum_api::persistence::postgres::PostgresStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("invalid configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting eventum-api");

    // Build persistence layer
    let store: Arc<dyn RecordStore> = if config.persistence_enabled {
        let store = PostgresStore::connect(&config)
            .await
            .context("cannot connect to database")?;
        if config.run_migrations {
            store.migrate().await.context("cannot apply migrations")?;
            tracing::info!("migrations applied");
        }
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled; records live in memory only");
        Arc::new(MemoryStore::with_reserved_roles().context("cannot seed reserved roles")?)
    };

    // Build application
    let app_state = AppState::new(store, &config);
    let app = api::app(app_state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
