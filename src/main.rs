//! analyticsd - bot analytics ingest daemon
//!
//! Accepts guild, member, error, event and command usage reports over HTTP
//! and records them in an in-memory metrics cache.

mod config;
mod error;
mod handlers;
mod http;
mod metrics;
mod schema;
mod state;
mod telemetry;

use crate::config::Config;
use crate::handlers::CommandUsageValidator;
use crate::http::AppState;
use crate::state::MetricsCache;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = crate::config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s). See error messages above.",
            errors.len()
        ));
    }

    info!(
        server = %config.server.name,
        address = %config.listen.address,
        "Starting analyticsd"
    );

    // Command schema (immutable for the life of the process)
    let schema = Arc::new(config.load_schema().map_err(|e| {
        error!(path = ?config.schema.path, error = %e, "Failed to load command schema");
        e
    })?);
    info!(
        commands = schema.len(),
        source = config.schema.path.as_deref().unwrap_or("built-in"),
        "Loaded command schema"
    );

    // Metrics cache (shared state)
    let cache = Arc::new(MetricsCache::new(&schema, config.events.known.iter().cloned()));
    info!(events = config.events.known.len(), "Metrics cache initialized");

    metrics::init();
    info!("Metrics initialized");

    let validator = CommandUsageValidator::new(Arc::clone(&schema), Arc::clone(&cache));
    let app = http::router(AppState::new(cache, validator, &config.auth.token));

    let listener = tokio::net::TcpListener::bind(config.listen.address)
        .await
        .map_err(|e| {
            error!(address = %config.listen.address, error = %e, "Failed to bind HTTP listener");
            e
        })?;

    http::run_http_server(listener, app).await?;

    info!("analyticsd stopped");
    Ok(())
}
