//! Rate-limited dispatch for calls against external services.
//!
//! A semaphore bounds how many calls are in flight and a shared "next slot"
//! enforces a minimum spacing between dispatches. Cancelling drains: every
//! pending and future `acquire` returns `None` without dispatching.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::config::ThrottleConfig;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("dispatch cancelled")]
    Cancelled,
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Upstream(Box<dyn std::error::Error + Send + Sync>),
}

/// Held for the duration of one external call.
pub struct ThrottlePermit {
    _permit: OwnedSemaphorePermit,
}

pub struct Throttle {
    semaphore: Arc<Semaphore>,
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
    cancelled: AtomicBool,
}

impl Throttle {
    pub fn new(max_concurrency: usize, min_interval: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            min_interval,
            next_slot: Mutex::new(None),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.max_concurrency, config.min_interval)
    }

    /// Wait for a free slot. `None` once the throttle has been cancelled.
    pub async fn acquire(&self) -> Option<ThrottlePermit> {
        if self.is_cancelled() {
            return None;
        }
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;

        let dispatch_at = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.min_interval);
            slot
        };
        tokio::time::sleep_until(dispatch_at).await;

        if self.is_cancelled() {
            return None;
        }
        Some(ThrottlePermit { _permit: permit })
    }

    /// Run `call` in a throttle slot, bounded by `timeout`.
    pub async fn call<T, F>(&self, timeout: Duration, call: F) -> Result<T, CallError>
    where
        F: Future<Output = Result<T, Box<dyn std::error::Error + Send + Sync>>>,
    {
        let _permit = self.acquire().await.ok_or(CallError::Cancelled)?;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result.map_err(CallError::Upstream),
            Err(_) => Err(CallError::TimedOut(timeout)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.semaphore.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
