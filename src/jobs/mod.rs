//! Job queue system for the scheduled passes

pub mod handlers;
pub mod types;

pub use types::{GenerateSignalJob, MonitorSignalsJob, ScanMarketJob, ScheduledJob};
