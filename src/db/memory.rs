//! Process-local signal store for tests and dry runs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::db::store::SignalStore;
use crate::models::signal::{DailySignal, NewSignal, SignalStatus};

#[derive(Default)]
pub struct InMemorySignalStore {
    signals: RwLock<Vec<DailySignal>>,
}

impl InMemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records (ids are kept as given).
    pub fn with_signals(signals: Vec<DailySignal>) -> Self {
        Self {
            signals: RwLock::new(signals),
        }
    }

    pub async fn all(&self) -> Vec<DailySignal> {
        self.signals.read().await.clone()
    }

    pub async fn get(&self, id: i64) -> Option<DailySignal> {
        self.signals.read().await.iter().find(|s| s.id == id).cloned()
    }
}

#[async_trait]
impl SignalStore for InMemorySignalStore {
    async fn insert_signal(
        &self,
        signal: NewSignal,
    ) -> Result<DailySignal, Box<dyn std::error::Error + Send + Sync>> {
        let mut signals = self.signals.write().await;
        let id = signals.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let stored = signal.into_signal(id);
        signals.push(stored.clone());
        Ok(stored)
    }

    async fn list_open_signals(
        &self,
    ) -> Result<Vec<DailySignal>, Box<dyn std::error::Error + Send + Sync>> {
        let signals = self.signals.read().await;
        Ok(signals
            .iter()
            .filter(|s| s.status == SignalStatus::Open)
            .cloned()
            .collect())
    }

    async fn update_signal_status(
        &self,
        id: i64,
        status: SignalStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut signals = self.signals.write().await;
        let signal = signals.iter_mut().find(|s| s.id == id).ok_or_else(|| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Signal with id {} not found", id),
            )) as Box<dyn std::error::Error + Send + Sync>
        })?;

        if signal.status.is_terminal() {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Signal {} is already {}", id, signal.status),
            )));
        }

        signal.status = status;
        signal.updated_at = updated_at;
        Ok(())
    }
}
