//! Persistence interface for daily signals

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::signal::{DailySignal, NewSignal, SignalStatus};

#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Persist a new signal and return it with its assigned id.
    async fn insert_signal(
        &self,
        signal: NewSignal,
    ) -> Result<DailySignal, Box<dyn std::error::Error + Send + Sync>>;

    /// Signals currently in `OPEN` status, oldest first.
    async fn list_open_signals(
        &self,
    ) -> Result<Vec<DailySignal>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_signal_status(
        &self,
        id: i64,
        status: SignalStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
