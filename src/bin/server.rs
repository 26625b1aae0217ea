//! CarPrice Server - used-car price prediction over HTTP
//!
//! Loads the trained pipeline once, then serves `/predict`, `/health`,
//! `/ready` and `/metrics`.
//!
//! # Usage
//! ```sh
//! MODEL_PATH=models/rf_model.json REDIS_URL=memory cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `API_HOST` / `API_PORT` - Listen address (default: 0.0.0.0:8000)
//! - `MODEL_PATH` - Trained pipeline artifact (default: models/rf_model.json)
//! - `REDIS_URL` - Result cache: a Redis URL, `memory`, or `none`
//!   (default: redis://localhost:6379/0)
//! - `CACHE_TIMEOUT_MS` - Upper bound on each cache round trip (default: 250)
//! - `REQUIRE_MODEL` - Refuse to start without a model (default: true)

use anyhow::Result;
use carprice::application::lifecycle;
use carprice::config::Config;
use carprice::interfaces::http;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("CarPrice Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Model={:?}, Cache={:?}, RequireModel={}",
        config.model_path, config.cache_mode, config.require_model
    );

    let service = Arc::new(lifecycle::build_service(&config).await?);

    http::serve(service, &config.bind_address(), shutdown_signal()).await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received. Draining connections...");
}
