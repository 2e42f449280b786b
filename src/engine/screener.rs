//! Watchlist reversal screener

use futures_util::stream::{self, StreamExt};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

use super::Engine;
use crate::core::throttle::CallError;
use crate::indicators::{calculate_ema, calculate_rsi};
use crate::models::{Quote, ScreenerMatch, ScreenerReport, TopMovers};
use crate::signals::detect_pattern;

const PASS: &str = "screener";

enum ScanOutcome {
    Match(ScreenerMatch),
    NoPattern,
    Skipped(&'static str),
    Failed(String),
}

/// Top `n` gainers (largest positive change first) and losers (most negative
/// first). Unchanged quotes are in neither list.
pub fn top_movers(quotes: &[Quote], n: usize) -> TopMovers {
    let by_change = |a: &&Quote, b: &&Quote| {
        b.change_percent
            .partial_cmp(&a.change_percent)
            .unwrap_or(Ordering::Equal)
    };

    let mut gainers: Vec<&Quote> = quotes.iter().filter(|q| q.change_percent > 0.0).collect();
    gainers.sort_by(by_change);

    let mut losers: Vec<&Quote> = quotes.iter().filter(|q| q.change_percent < 0.0).collect();
    losers.sort_by(|a, b| by_change(b, a));

    TopMovers {
        gainers: gainers.into_iter().take(n).cloned().collect(),
        losers: losers.into_iter().take(n).cloned().collect(),
    }
}

/// Most extreme RSI first. Stable, so ties keep watchlist order.
pub fn rank_matches(matches: &mut [ScreenerMatch]) {
    matches.sort_by(|a, b| {
        (b.rsi - 50.0)
            .abs()
            .partial_cmp(&(a.rsi - 50.0).abs())
            .unwrap_or(Ordering::Equal)
    });
}

impl Engine {
    /// Scan the watchlist for reversal patterns and collect the day's movers.
    ///
    /// Never fails as a whole: each symbol is isolated and lands in exactly
    /// one of `scanned`, `skipped` or `failed`.
    pub async fn run_screener(&self) -> ScreenerReport {
        let watchlist = &self.config.watchlist;
        info!(symbols = watchlist.len(), "Screener: scanning {} symbols", watchlist.len());

        let movers = match self.fetch(self.market_data.get_quotes(watchlist)).await {
            Ok(quotes) => top_movers(&quotes, self.config.top_movers),
            Err(e) => {
                warn!(error = %e, "Screener: quote snapshot failed, movers left empty");
                TopMovers::default()
            }
        };

        let concurrency = self.config.throttle.max_concurrency.max(1);
        let outcomes: Vec<(String, ScanOutcome)> = stream::iter(watchlist.iter().cloned())
            .map(|symbol| async move {
                let outcome = self.scan_symbol(&symbol).await;
                (symbol, outcome)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut report = ScreenerReport {
            movers,
            ..ScreenerReport::default()
        };

        for (symbol, outcome) in outcomes {
            match outcome {
                ScanOutcome::Match(m) => {
                    report.scanned.push(symbol);
                    report.matches.push(m);
                }
                ScanOutcome::NoPattern => report.scanned.push(symbol),
                ScanOutcome::Skipped(reason) => {
                    debug!(symbol = %symbol, reason = reason, "Screener: skipped {} ({})", symbol, reason);
                    self.record_skip(PASS, reason);
                    report.skipped.push(symbol);
                }
                ScanOutcome::Failed(error) => {
                    warn!(symbol = %symbol, error = %error, "Screener: failed to scan {}", symbol);
                    self.record_skip(PASS, "error");
                    report.failed.push(symbol);
                }
            }
        }

        if let Some(ref profiles) = self.profiles {
            for m in &mut report.matches {
                m.sector = profiles.sector(&m.symbol).await;
            }
        }

        rank_matches(&mut report.matches);
        self.record_pass(PASS);

        info!(
            matches = report.matches.len(),
            scanned = report.scanned.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Screener: {} matches across {} scanned symbols",
            report.matches.len(),
            report.scanned.len()
        );
        report
    }

    async fn scan_symbol(&self, symbol: &str) -> ScanOutcome {
        if self.is_cancelled() {
            return ScanOutcome::Skipped("cancelled");
        }

        let candles = match self
            .fetch(self.market_data.get_history(symbol, self.config.history_lookback_days))
            .await
        {
            Ok(candles) => candles,
            Err(CallError::Cancelled) => return ScanOutcome::Skipped("cancelled"),
            Err(CallError::TimedOut(_)) => return ScanOutcome::Skipped("timeout"),
            Err(e) => return ScanOutcome::Failed(e.to_string()),
        };

        let (Some(ema20), Some(rsi)) = (
            calculate_ema(&candles, self.config.ema_period),
            calculate_rsi(&candles, self.config.rsi_period),
        ) else {
            return ScanOutcome::Skipped("insufficient_history");
        };
        let Some(last) = candles.last() else {
            return ScanOutcome::Skipped("insufficient_history");
        };

        match detect_pattern(&candles, ema20, rsi) {
            Some(hit) => {
                debug!(symbol = %symbol, pattern = %hit.pattern, "Screener: {} shows {}", symbol, hit.pattern);
                ScanOutcome::Match(ScreenerMatch {
                    symbol: symbol.to_string(),
                    price: last.close,
                    pattern: hit.pattern,
                    reason: hit.reason,
                    rsi,
                    ema20,
                    sector: None,
                })
            }
            None => ScanOutcome::NoPattern,
        }
    }
}
