//! Candlescope API Server
//!
//! HTTP API with health check, metrics, activity, indicator, screener and
//! open-signal endpoints. Stateless apart from the signal store; can be
//! horizontally scaled.

use candlescope::config::EngineConfig;
use candlescope::core::bootstrap::{build_engine, BootstrapOptions};
use candlescope::core::http::{start_server, AppState};
use candlescope::logging;
use candlescope::metrics::Metrics;
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let env = candlescope::config::get_environment();
    info!("Starting Candlescope API Server");
    info!(environment = %env, "Environment");
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);

    let metrics = Arc::new(Metrics::new().map_err(|e| format!("Failed to create metrics: {}", e))?);

    // API works without the engine, but only /health and /metrics answer then
    let engine = match build_engine(EngineConfig::from_env(), metrics.clone(), BootstrapOptions::default()).await {
        Ok(engine) => Some(Arc::new(engine)),
        Err(e) => {
            warn!(error = %e, "Engine unavailable - data endpoints will return 503");
            None
        }
    };

    let state = AppState::new(metrics, engine);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, state).await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
            info!("API server stopped");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
