//! Apalis handlers: each job runs one engine pass

use apalis::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::engine::Engine;
use crate::jobs::types::{GenerateSignalJob, MonitorSignalsJob, ScanMarketJob};

/// Runs the daily generator. Only a persistence failure is reported back to
/// the queue; symbol-level problems are already folded into the report.
pub async fn handle_generate_signal(
    job: GenerateSignalJob,
    engine: Data<Arc<Engine>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();
    info!(requested_at = %job.requested_at, "GenerateSignalJob: started");

    let report = engine.generate_daily_signal().await.map_err(|e| {
        error!(error = %e, "GenerateSignalJob: failed to record daily signal");
        Box::new(std::io::Error::other(format!("Signal generation failed: {}", e)))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    info!(
        action = %report.signal.action,
        symbol = %report.signal.symbol,
        active = report.active,
        candidates = report.candidates.len(),
        duration_ms = start.elapsed().as_millis(),
        "GenerateSignalJob: recorded {} {} from {} candidates",
        report.signal.action,
        report.signal.symbol,
        report.candidates.len()
    );
    Ok(())
}

pub async fn handle_monitor_signals(
    job: MonitorSignalsJob,
    engine: Data<Arc<Engine>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();
    info!(requested_at = %job.requested_at, "MonitorSignalsJob: started");

    let report = engine.monitor_open_signals().await.map_err(|e| {
        Box::new(std::io::Error::other(format!("Signal monitoring failed: {}", e)))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    info!(
        checked = report.checked,
        hit_tp = report.hit_tp,
        hit_sl = report.hit_sl,
        failed = report.failed,
        duration_ms = start.elapsed().as_millis(),
        "MonitorSignalsJob: {} checked, {} transitions",
        report.checked,
        report.hit_tp + report.hit_sl
    );
    Ok(())
}

pub async fn handle_scan_market(
    job: ScanMarketJob,
    engine: Data<Arc<Engine>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let start = Instant::now();
    info!(requested_at = %job.requested_at, "ScanMarketJob: started");

    let report = engine.run_screener().await;
    for m in &report.matches {
        info!(
            symbol = %m.symbol,
            pattern = %m.pattern,
            rsi = m.rsi,
            "ScanMarketJob: {} {} (RSI {:.1})",
            m.symbol,
            m.pattern,
            m.rsi
        );
    }

    info!(
        matches = report.matches.len(),
        failed = report.failed.len(),
        duration_ms = start.elapsed().as_millis(),
        "ScanMarketJob: {} matches",
        report.matches.len()
    );
    Ok(())
}
