//! Batch passes over the market: screener, daily signal generator and signal
//! monitor, plus on-demand activity detection.
//!
//! All passes share one [`Engine`] holding the collaborators and one
//! [`Throttle`], so concurrent passes stay inside a single rate limit.

pub mod generator;
pub mod monitor;
pub mod screener;

pub use generator::GenerationReport;
pub use monitor::{evaluate_buy, MonitorDecision, MonitorOutcome, MonitorReport};
pub use screener::top_movers;

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::config::EngineConfig;
use crate::core::lock::{LocalRunLock, RunLock};
use crate::core::throttle::{CallError, Throttle};
use crate::db::SignalStore;
use crate::indicators::series::IndicatorSeries;
use crate::metrics::Metrics;
use crate::models::{ActivitySignal, IndicatorPeriods, IndicatorSnapshot};
use crate::services::{CachedProfileService, MarketDataProvider, NarrativeGenerator, Notifier};
use crate::signals::ActivityDetector;

pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) market_data: Arc<dyn MarketDataProvider>,
    pub(crate) store: Arc<dyn SignalStore>,
    pub(crate) narrator: Arc<dyn NarrativeGenerator>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) profiles: Option<Arc<CachedProfileService>>,
    pub(crate) lock: Arc<dyn RunLock>,
    pub(crate) metrics: Option<Arc<Metrics>>,
    throttle: Throttle,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        market_data: Arc<dyn MarketDataProvider>,
        store: Arc<dyn SignalStore>,
        narrator: Arc<dyn NarrativeGenerator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let throttle = Throttle::from_config(&config.throttle);
        Self {
            config,
            market_data,
            store,
            narrator,
            notifier,
            profiles: None,
            lock: Arc::new(LocalRunLock::new()),
            metrics: None,
            throttle,
        }
    }

    pub fn with_profiles(mut self, profiles: Arc<CachedProfileService>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Replace the in-process lock, e.g. with a Redis lock shared by workers.
    pub fn with_lock(mut self, lock: Arc<dyn RunLock>) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SignalStore> {
        &self.store
    }

    /// Stop dispatching external calls. Passes in progress drain their
    /// remaining work as skipped.
    pub fn cancel(&self) {
        self.throttle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.throttle.is_cancelled()
    }

    /// Run an external call through the shared throttle with the configured timeout.
    pub(crate) async fn fetch<T, F>(&self, call: F) -> Result<T, CallError>
    where
        F: Future<Output = Result<T, Box<dyn std::error::Error + Send + Sync>>>,
    {
        let started = Instant::now();
        let result = self
            .throttle
            .call(self.config.throttle.request_timeout, call)
            .await;
        if let Some(ref metrics) = self.metrics {
            metrics
                .external_call_duration_seconds
                .observe(started.elapsed().as_secs_f64());
        }
        result
    }

    /// Best-effort broadcast bounded by the request timeout. Failures and
    /// timeouts are logged and never reach the caller.
    pub(crate) async fn notify(&self, pass: &str, title: &str, body: &str, metadata: &Value) {
        let timeout = self.config.throttle.request_timeout;
        match tokio::time::timeout(timeout, self.notifier.broadcast(title, body, metadata)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(pass = pass, title = %title, error = %e, "Notification failed: {}", title);
            }
            Err(_) => {
                warn!(pass = pass, title = %title, "Notification timed out after {:?}: {}", timeout, title);
            }
        }
    }

    pub(crate) fn record_pass(&self, kind: &str) {
        if let Some(ref metrics) = self.metrics {
            metrics.passes_total.with_label_values(&[kind]).inc();
        }
    }

    pub(crate) fn record_skip(&self, pass: &str, reason: &str) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_skip(pass, reason);
        }
    }

    fn periods(&self) -> IndicatorPeriods {
        IndicatorPeriods {
            ema: self.config.ema_period,
            rsi: self.config.rsi_period,
            ..IndicatorPeriods::default()
        }
    }

    /// Big-volume and breakout events over the symbol's recent history.
    pub async fn detect_activity(
        &self,
        symbol: &str,
    ) -> Result<Vec<ActivitySignal>, Box<dyn std::error::Error + Send + Sync>> {
        let candles = self
            .fetch(self.market_data.get_history(symbol, self.config.history_lookback_days))
            .await
            .map_err(|e| {
                warn!(symbol = %symbol, error = %e, "Activity: history unavailable for {}", symbol);
                Box::new(e) as Box<dyn std::error::Error + Send + Sync>
            })?;

        Ok(ActivityDetector::new(self.config.detector).detect(&candles))
    }

    /// Per-candle indicator values for the symbol's recent history.
    pub async fn indicator_series(
        &self,
        symbol: &str,
    ) -> Result<Vec<IndicatorSnapshot>, Box<dyn std::error::Error + Send + Sync>> {
        let candles = self
            .fetch(self.market_data.get_history(symbol, self.config.history_lookback_days))
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

        Ok(IndicatorSeries::new(&candles, self.periods()).collect())
    }
}
