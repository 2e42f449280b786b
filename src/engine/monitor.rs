//! Resolution of open BUY signals against the latest price.

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::Engine;
use crate::models::{DailySignal, SignalAction, SignalStatus};

const PASS: &str = "monitor";

/// Where a price sits relative to a BUY signal's levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorDecision {
    HitTarget,
    HitStop,
    StillOpen,
}

impl MonitorDecision {
    pub fn status(&self) -> Option<SignalStatus> {
        match self {
            MonitorDecision::HitTarget => Some(SignalStatus::HitTp),
            MonitorDecision::HitStop => Some(SignalStatus::HitSl),
            MonitorDecision::StillOpen => None,
        }
    }
}

/// Target is checked before stop, so a degenerate plan with both hit
/// resolves as a win.
pub fn evaluate_buy(price: f64, target: f64, stop_loss: f64) -> MonitorDecision {
    if price >= target {
        MonitorDecision::HitTarget
    } else if price <= stop_loss {
        MonitorDecision::HitStop
    } else {
        MonitorDecision::StillOpen
    }
}

/// What happened to one open signal during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorOutcome {
    Transitioned(SignalStatus),
    StillOpen,
    /// WAIT / CASH records carry no levels.
    NotMonitored,
    /// SELL resolution is not implemented; the status is left alone.
    Unsupported,
    /// Another run holds the record's lock.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorReport {
    pub checked: usize,
    pub hit_tp: usize,
    pub hit_sl: usize,
    pub still_open: usize,
    pub unsupported: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl MonitorReport {
    fn tally(&mut self, outcome: &MonitorOutcome) {
        match outcome {
            MonitorOutcome::Transitioned(SignalStatus::HitTp) => self.hit_tp += 1,
            MonitorOutcome::Transitioned(SignalStatus::HitSl) => self.hit_sl += 1,
            MonitorOutcome::Transitioned(_) | MonitorOutcome::StillOpen => self.still_open += 1,
            MonitorOutcome::NotMonitored => return,
            MonitorOutcome::Unsupported => self.unsupported += 1,
            MonitorOutcome::Skipped => self.skipped += 1,
            MonitorOutcome::Failed(_) => self.failed += 1,
        }
        self.checked += 1;
    }
}

impl Engine {
    /// Check every open signal once. Records are independent; one failing
    /// never stops the others.
    pub async fn monitor_open_signals(
        &self,
    ) -> Result<MonitorReport, Box<dyn std::error::Error + Send + Sync>> {
        let open = self.store.list_open_signals().await.map_err(|e| {
            error!(error = %e, "Monitor: failed to list open signals");
            e
        })?;
        info!(open = open.len(), "Monitor: checking {} open signals", open.len());

        let concurrency = self.config.throttle.max_concurrency.max(1);
        let outcomes: Vec<MonitorOutcome> = stream::iter(open)
            .map(|signal| async move { self.check_signal(&signal).await })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = MonitorReport::default();
        for outcome in &outcomes {
            report.tally(outcome);
        }
        self.record_pass(PASS);

        info!(
            checked = report.checked,
            hit_tp = report.hit_tp,
            hit_sl = report.hit_sl,
            failed = report.failed,
            "Monitor: {} checked, {} hit target, {} hit stop",
            report.checked,
            report.hit_tp,
            report.hit_sl
        );
        Ok(report)
    }

    pub async fn check_signal(&self, signal: &DailySignal) -> MonitorOutcome {
        if signal.is_cash() {
            return MonitorOutcome::NotMonitored;
        }
        if signal.action == SignalAction::Sell {
            warn!(id = signal.id, symbol = %signal.symbol, "Monitor: SELL signal {} left unresolved", signal.id);
            return MonitorOutcome::Unsupported;
        }

        let (Some(target), Some(stop_loss)) = (signal.target_price, signal.stop_loss) else {
            warn!(id = signal.id, symbol = %signal.symbol, "Monitor: signal {} has no target/stop", signal.id);
            return MonitorOutcome::Failed("missing target or stop".to_string());
        };

        let key = format!("signal:{}", signal.id);
        let token = match self.lock.try_acquire(&key, self.config.lock_ttl).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(id = signal.id, "Monitor: signal {} is locked by another run", signal.id);
                self.record_skip(PASS, "locked");
                return MonitorOutcome::Skipped;
            }
            Err(e) => {
                warn!(id = signal.id, error = %e, "Monitor: lock unavailable for signal {}", signal.id);
                return MonitorOutcome::Failed(e.to_string());
            }
        };

        let (outcome, alert) = self.resolve_buy(signal, target, stop_loss).await;

        match self.lock.release(&key, &token).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(id = signal.id, "Monitor: lock for signal {} expired before release", signal.id);
            }
            Err(e) => {
                warn!(id = signal.id, error = %e, "Monitor: failed to release lock for signal {}", signal.id);
            }
        }

        // Delivered outside the lock so a slow channel never holds a record
        if let Some(alert) = alert {
            self.notify(PASS, &alert.title, &alert.body, &alert.metadata).await;
        }
        outcome
    }

    async fn resolve_buy(
        &self,
        signal: &DailySignal,
        target: f64,
        stop_loss: f64,
    ) -> (MonitorOutcome, Option<Alert>) {
        let price = match self.fetch(self.market_data.get_latest_price(&signal.symbol)).await {
            Ok(Some(price)) => price,
            Ok(None) => {
                warn!(symbol = %signal.symbol, "Monitor: no price for {}", signal.symbol);
                return (MonitorOutcome::Failed(format!("no price for {}", signal.symbol)), None);
            }
            Err(e) => {
                warn!(symbol = %signal.symbol, error = %e, "Monitor: price fetch failed for {}", signal.symbol);
                return (MonitorOutcome::Failed(e.to_string()), None);
            }
        };

        let decision = evaluate_buy(price, target, stop_loss);
        let Some(status) = decision.status() else {
            debug!(symbol = %signal.symbol, price = price, "Monitor: {} still open at {:.2}", signal.symbol, price);
            return (MonitorOutcome::StillOpen, None);
        };

        if let Err(e) = self
            .store
            .update_signal_status(signal.id, status, Utc::now())
            .await
        {
            error!(id = signal.id, error = %e, "Monitor: failed to persist {} for signal {}", status, signal.id);
            return (MonitorOutcome::Failed(e.to_string()), None);
        }

        info!(
            id = signal.id,
            symbol = %signal.symbol,
            status = %status,
            price = price,
            "Monitor: {} {} at {:.2}",
            signal.symbol,
            status,
            price
        );
        if let Some(ref metrics) = self.metrics {
            metrics
                .signal_transitions_total
                .with_label_values(&[status.as_str()])
                .inc();
        }

        let (title, level) = match status {
            SignalStatus::HitTp => (format!("Target hit: {}", signal.symbol), target),
            _ => (format!("Stop loss hit: {}", signal.symbol), stop_loss),
        };
        let alert = Alert {
            title,
            body: format!(
                "Price {:.2} crossed {:.2} (entry {:.2})",
                price,
                level,
                signal.entry_price.unwrap_or_default()
            ),
            metadata: json!({
                "id": signal.id,
                "symbol": signal.symbol,
                "status": status,
                "price": price,
            }),
        };

        (MonitorOutcome::Transitioned(status), Some(alert))
    }
}

/// Transition notice, sent once the record's lock is released.
struct Alert {
    title: String,
    body: String,
    metadata: Value,
}
