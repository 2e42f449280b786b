//! Daily signal generation: filter, rank, plan, persist, notify.

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::Engine;
use crate::core::throttle::CallError;
use crate::indicators::{calculate_ema, calculate_rsi};
use crate::models::{DailySignal, NewSignal, PlanSource, Quote, TradePlan};
use crate::signals::{
    build_prompt, fallback_plan, parse_trade_plan, rank_candidates, Candidate, PromptFacts,
};

const PASS: &str = "generator";

/// Counts for one generator run and the record it persisted.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub universe: usize,
    pub active: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Ranked best first.
    pub candidates: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<TradePlan>,
    pub signal: DailySignal,
}

enum Evaluation {
    Candidate(Box<Candidate>),
    Rejected,
    Skipped(&'static str),
    Failed(String),
}

impl Engine {
    /// Pick at most one stock for today and persist the decision.
    ///
    /// Symbol-level problems only lower the counts; the only error returned
    /// is a failure to persist the final record.
    pub async fn generate_daily_signal(
        &self,
    ) -> Result<GenerationReport, Box<dyn std::error::Error + Send + Sync>> {
        let universe = &self.config.universe;
        info!(universe = universe.len(), "Generator: evaluating {} symbols", universe.len());

        let mut failed = 0;
        let mut quotes_failed = false;
        let quotes = match self.fetch(self.market_data.get_quotes(universe)).await {
            Ok(quotes) => quotes,
            Err(e) => {
                error!(error = %e, "Generator: quote snapshot failed, no stock can be evaluated");
                failed = universe.len();
                quotes_failed = true;
                Vec::new()
            }
        };

        let filter = self.config.active_filter;
        let active: Vec<Quote> = quotes.into_iter().filter(|q| filter.is_active(q)).collect();
        debug!(active = active.len(), "Generator: {} active stocks", active.len());

        let concurrency = self.config.throttle.max_concurrency.max(1);
        let evaluations: Vec<(String, Evaluation)> = stream::iter(active.iter().cloned())
            .map(|quote| async move {
                let symbol = quote.symbol.clone();
                (symbol, self.evaluate(quote).await)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut evaluated = 0;
        let mut skipped = 0;
        let mut candidates = Vec::new();
        for (symbol, evaluation) in evaluations {
            match evaluation {
                Evaluation::Candidate(candidate) => {
                    evaluated += 1;
                    candidates.push(*candidate);
                }
                Evaluation::Rejected => evaluated += 1,
                Evaluation::Skipped(reason) => {
                    debug!(symbol = %symbol, reason = reason, "Generator: skipped {} ({})", symbol, reason);
                    self.record_skip(PASS, reason);
                    skipped += 1;
                }
                Evaluation::Failed(e) => {
                    warn!(symbol = %symbol, error = %e, "Generator: failed to evaluate {}", symbol);
                    self.record_skip(PASS, "error");
                    failed += 1;
                }
            }
        }

        rank_candidates(&mut candidates);

        let (new_signal, plan) = match candidates.first() {
            None if quotes_failed => {
                info!("Generator: quotes unavailable, recording WAIT");
                (NewSignal::wait(self.config.outage_summary.clone(), Utc::now()), None)
            }
            None => {
                info!("Generator: no candidates, recording WAIT");
                (NewSignal::wait(self.config.wait_summary.clone(), Utc::now()), None)
            }
            Some(winner) => {
                let plan = self.plan_for(winner).await;
                info!(
                    symbol = %winner.symbol(),
                    score = winner.score,
                    entry = plan.entry,
                    target = plan.target,
                    stop_loss = plan.stop_loss,
                    source = ?plan.source,
                    "Generator: BUY {} (entry {:.2}, target {:.2}, stop {:.2})",
                    winner.symbol(),
                    plan.entry,
                    plan.target,
                    plan.stop_loss
                );
                (NewSignal::buy(winner.symbol(), &plan, Utc::now()), Some(plan))
            }
        };

        let signal = self.store.insert_signal(new_signal).await.map_err(|e| {
            error!(error = %e, "Generator: failed to persist daily signal");
            e
        })?;

        if let Some(ref metrics) = self.metrics {
            metrics
                .signals_generated_total
                .with_label_values(&[signal.action.as_str()])
                .inc();
        }
        self.notify_signal(&signal).await;
        self.record_pass(PASS);

        Ok(GenerationReport {
            universe: universe.len(),
            active: active.len(),
            evaluated,
            skipped,
            failed,
            candidates,
            plan,
            signal,
        })
    }

    async fn evaluate(&self, quote: Quote) -> Evaluation {
        if self.is_cancelled() {
            return Evaluation::Skipped("cancelled");
        }

        let candles = match self
            .fetch(
                self.market_data
                    .get_history(&quote.symbol, self.config.history_lookback_days),
            )
            .await
        {
            Ok(candles) => candles,
            Err(CallError::Cancelled) => return Evaluation::Skipped("cancelled"),
            Err(CallError::TimedOut(_)) => return Evaluation::Skipped("timeout"),
            Err(e) => return Evaluation::Failed(e.to_string()),
        };

        if candles.len() < self.config.min_history {
            return Evaluation::Skipped("insufficient_history");
        }

        let (Some(ema20), Some(rsi), Some(last)) = (
            calculate_ema(&candles, self.config.ema_period),
            calculate_rsi(&candles, self.config.rsi_period),
            candles.last(),
        ) else {
            return Evaluation::Skipped("insufficient_history");
        };

        if self.config.technical_gate.passes(last.close, ema20, rsi) {
            Evaluation::Candidate(Box::new(Candidate::new(quote, last.close, rsi, ema20)))
        } else {
            Evaluation::Rejected
        }
    }

    /// Narrative plan when it parses and is internally consistent, the
    /// mechanical plan otherwise.
    async fn plan_for(&self, winner: &Candidate) -> TradePlan {
        let sector = match self.profiles {
            Some(ref profiles) => profiles.sector(winner.symbol()).await,
            None => None,
        };
        let prompt = build_prompt(&PromptFacts {
            symbol: winner.symbol().to_string(),
            sector,
            price: winner.quote.price,
            change_percent: winner.quote.change_percent,
            volume_ratio: winner.volume_ratio,
            rsi: winner.rsi,
            ema20: winner.ema20,
        });

        let timeout = self.config.throttle.request_timeout;
        let raw = match tokio::time::timeout(timeout, self.narrator.generate_plan(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(symbol = %winner.symbol(), error = %e, "Generator: narrative failed, using fallback plan");
                return fallback_plan(winner.quote.price, winner.volume_ratio);
            }
            Err(_) => {
                warn!(symbol = %winner.symbol(), "Generator: narrative timed out after {:?}, using fallback plan", timeout);
                return fallback_plan(winner.quote.price, winner.volume_ratio);
            }
        };

        match parse_trade_plan(&raw, winner.quote.price) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(symbol = %winner.symbol(), error = %e, "Generator: unusable narrative, using fallback plan");
                fallback_plan(winner.quote.price, winner.volume_ratio)
            }
        }
    }

    async fn notify_signal(&self, signal: &DailySignal) {
        let (title, body) = if signal.is_cash() {
            (
                "Daily signal: WAIT".to_string(),
                signal.analysis_summary.clone(),
            )
        } else {
            (
                format!("Daily signal: {} {}", signal.action, signal.symbol),
                format!(
                    "Entry {:.2} | Target {:.2} | Stop {:.2} | Confidence {:.0}%\n{}",
                    signal.entry_price.unwrap_or_default(),
                    signal.target_price.unwrap_or_default(),
                    signal.stop_loss.unwrap_or_default(),
                    signal.ai_confidence.unwrap_or_default(),
                    signal.analysis_summary
                ),
            )
        };
        let metadata = json!({
            "id": signal.id,
            "symbol": signal.symbol,
            "action": signal.action,
            "status": signal.status,
        });

        self.notify(PASS, &title, &body, &metadata).await;
    }
}

impl GenerationReport {
    pub fn plan_source(&self) -> Option<PlanSource> {
        self.plan.as_ref().map(|p| p.source)
    }
}
