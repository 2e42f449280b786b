//! Run a single pass from the command line and print its report as JSON.
//!
//! Useful for cron-driven deployments without Redis and for ad-hoc checks.

use candlescope::config::EngineConfig;
use candlescope::core::bootstrap::{build_engine, BootstrapOptions};
use candlescope::logging;
use candlescope::metrics::Metrics;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "pass", about = "Run one candlescope pass and print the report")]
struct Cli {
    /// Keep signals in memory instead of QuestDB.
    #[arg(long, default_value_t = false, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick today's signal (or WAIT) and persist it.
    Generate,
    /// Resolve open signals against the latest prices.
    Monitor,
    /// Scan the watchlist for reversal patterns.
    Screen,
    /// Big-volume and breakout events for one symbol.
    Activity {
        /// Symbol, e.g. BBCA.JK
        symbol: String,
    },
    /// Per-candle indicator values for one symbol.
    Indicators {
        symbol: String,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();
    let cli = Cli::parse();

    let metrics = Arc::new(Metrics::new().map_err(|e| format!("Failed to create metrics: {}", e))?);
    let options = BootstrapOptions {
        in_memory: cli.in_memory,
        ..BootstrapOptions::default()
    };
    let engine = Arc::new(build_engine(EngineConfig::from_env(), metrics, options).await?);

    let watcher = {
        let engine = engine.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, draining remaining work");
                engine.cancel();
            }
        })
    };

    let result = match cli.command {
        Commands::Generate => print_json(&engine.generate_daily_signal().await?),
        Commands::Monitor => print_json(&engine.monitor_open_signals().await?),
        Commands::Screen => print_json(&engine.run_screener().await),
        Commands::Activity { symbol } => print_json(&engine.detect_activity(&symbol).await?),
        Commands::Indicators { symbol } => print_json(&engine.indicator_series(&symbol).await?),
    };

    watcher.abort();
    result
}
