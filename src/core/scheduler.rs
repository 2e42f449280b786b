//! Cron-based scheduler for enqueuing pass jobs

use crate::jobs::types::ScheduledJob;
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::{de::DeserializeOwned, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Parse a 6-field (seconds first) cron expression.
pub fn parse_schedule(expr: &str) -> Result<Schedule, Box<dyn std::error::Error + Send + Sync>> {
    Schedule::from_str(expr).map_err(|e| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid cron expression '{}': {}", expr, e),
        )) as Box<dyn std::error::Error + Send + Sync>
    })
}

/// Next tick strictly after `now`, if the schedule has one.
pub fn next_tick(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&now).next()
}

/// Enqueues one `J` on every tick of a cron schedule.
pub struct JobScheduler<J> {
    storage: Arc<RedisStorage<J>>,
    schedule: Schedule,
    cron_expr: String,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl<J> JobScheduler<J>
where
    J: ScheduledJob + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static,
{
    pub fn new(
        storage: Arc<RedisStorage<J>>,
        cron_expr: &str,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let schedule = parse_schedule(cron_expr)?;

        info!(
            job = J::NAME,
            cron = %cron_expr,
            "JobScheduler: {} scheduled with cron '{}'",
            J::NAME,
            cron_expr
        );

        Ok(Self {
            storage,
            schedule,
            cron_expr: cron_expr.to_string(),
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.is_running().await {
            warn!(job = J::NAME, "JobScheduler: {} already running", J::NAME);
            return Ok(());
        }

        let storage = self.storage.clone();
        let schedule = self.schedule.clone();
        let handle_arc = self.handle.clone();

        let handle = tokio::spawn(async move {
            info!(job = J::NAME, "JobScheduler: {} waiting for cron schedule...", J::NAME);

            loop {
                let now = Utc::now();
                let Some(tick) = next_tick(&schedule, now) else {
                    tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                    continue;
                };
                let duration = (tick - now).to_std().unwrap_or_default();
                tokio::time::sleep(duration).await;

                let mut storage_clone = (*storage).clone();
                match storage_clone.push(J::at(tick)).await {
                    Ok(_) => {
                        debug!(job = J::NAME, tick = %tick, "JobScheduler: enqueued {}", J::NAME);
                    }
                    Err(e) => {
                        error!(
                            job = J::NAME,
                            error = %e,
                            "JobScheduler: failed to enqueue {}",
                            J::NAME
                        );
                    }
                }
            }
        });

        {
            let mut h = handle_arc.write().await;
            *h = Some(handle);
        }

        info!(job = J::NAME, cron = %self.cron_expr, "JobScheduler: {} started", J::NAME);
        Ok(())
    }

    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!(job = J::NAME, "JobScheduler: {} stopped", J::NAME);
        }
    }

    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.is_some()
    }
}
