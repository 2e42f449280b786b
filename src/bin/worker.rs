//! Candlescope Worker
//!
//! Runs the scheduled passes (daily signal, monitor, screener) from the Redis
//! queue. Can be run as a separate process/instance from the API server.

use candlescope::config::EngineConfig;
use candlescope::core::bootstrap::{build_engine, BootstrapOptions};
use candlescope::core::runtime::{JobQueues, SignalRuntime};
use candlescope::core::scheduler::JobScheduler;
use candlescope::jobs::types::{GenerateSignalJob, MonitorSignalsJob, ScanMarketJob};
use candlescope::logging;
use candlescope::metrics::Metrics;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();

    let env = candlescope::config::get_environment();
    info!("Starting Candlescope Worker");
    info!(environment = %env, "Environment");

    let config = EngineConfig::from_env();
    let schedule = config.schedule.clone();
    info!(
        universe = config.universe.len(),
        watchlist = config.watchlist.len(),
        concurrency = config.throttle.max_concurrency,
        "Universe: {} symbols, watchlist: {} symbols",
        config.universe.len(),
        config.watchlist.len()
    );

    let metrics = Arc::new(Metrics::new().map_err(|e| format!("Failed to create metrics: {}", e))?);

    // Workers share run locks through Redis so overlapping monitors never
    // resolve the same signal twice
    let options = BootstrapOptions {
        require_database: true,
        in_memory: false,
        redis_locks: true,
    };
    let engine = Arc::new(build_engine(config, metrics, options).await?);

    info!("Initializing Apalis Redis storage...");
    let redis_url = candlescope::config::get_redis_url();
    let queues = JobQueues::connect(&redis_url).await?;
    info!("Apalis Redis storage initialized");

    info!("Starting Apalis workers...");
    let runtime = SignalRuntime::new(engine.clone(), queues.clone());
    let worker_handles = runtime.start_workers().await?;

    info!("Starting job schedulers...");
    let generate: JobScheduler<GenerateSignalJob> =
        JobScheduler::new(queues.generate.clone(), &schedule.generate_cron)?;
    let monitor: JobScheduler<MonitorSignalsJob> =
        JobScheduler::new(queues.monitor.clone(), &schedule.monitor_cron)?;
    let scan: JobScheduler<ScanMarketJob> =
        JobScheduler::new(queues.scan.clone(), &schedule.scan_cron)?;
    generate.start().await?;
    monitor.start().await?;
    scan.start().await?;

    info!("Worker started, waiting for shutdown signal...");
    signal::ctrl_c().await?;

    info!("Shutting down worker...");
    engine.cancel();
    generate.stop().await;
    monitor.stop().await;
    scan.stop().await;
    for handle in worker_handles {
        handle.abort();
    }
    info!("Worker stopped");

    Ok(())
}

