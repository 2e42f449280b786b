//! Job payloads pushed by the scheduler and consumed by the workers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run the daily signal generator once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSignalJob {
    pub requested_at: DateTime<Utc>,
}

/// Check every open signal against the latest price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSignalsJob {
    pub requested_at: DateTime<Utc>,
}

/// Run the watchlist screener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMarketJob {
    pub requested_at: DateTime<Utc>,
}

/// A job that can be created on a schedule tick.
pub trait ScheduledJob {
    const NAME: &'static str;

    fn at(requested_at: DateTime<Utc>) -> Self;
}

impl ScheduledJob for GenerateSignalJob {
    const NAME: &'static str = "generate-signal";

    fn at(requested_at: DateTime<Utc>) -> Self {
        Self { requested_at }
    }
}

impl ScheduledJob for MonitorSignalsJob {
    const NAME: &'static str = "monitor-signals";

    fn at(requested_at: DateTime<Utc>) -> Self {
        Self { requested_at }
    }
}

impl ScheduledJob for ScanMarketJob {
    const NAME: &'static str = "scan-market";

    fn at(requested_at: DateTime<Utc>) -> Self {
        Self { requested_at }
    }
}
