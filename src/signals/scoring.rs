//! Active-stock filter, technical gate and candidate ranking

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::quote::Quote;

/// Pre-filter applied to the quote snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveFilter {
    /// Penny-stock exclusion
    pub min_price: f64,
    pub min_change_percent: f64,
    pub volume_spike_ratio: f64,
}

impl Default for ActiveFilter {
    fn default() -> Self {
        Self {
            min_price: 200.0,
            min_change_percent: 1.0,
            volume_spike_ratio: 1.2,
        }
    }
}

impl ActiveFilter {
    /// `price > min_price` and either a gain or a volume spike.
    pub fn is_active(&self, quote: &Quote) -> bool {
        quote.price > self.min_price
            && (quote.change_percent >= self.min_change_percent
                || quote.volume > self.volume_spike_ratio * quote.avg_volume)
    }
}

/// Trend and momentum gate for candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalGate {
    pub rsi_min: f64,
    pub rsi_max: f64,
}

impl Default for TechnicalGate {
    fn default() -> Self {
        Self {
            rsi_min: 30.0,
            rsi_max: 75.0,
        }
    }
}

impl TechnicalGate {
    /// Close above EMA20 with RSI inside `[rsi_min, rsi_max]`.
    pub fn passes(&self, close: f64, ema20: f64, rsi: f64) -> bool {
        close > ema20 && rsi >= self.rsi_min && rsi <= self.rsi_max
    }
}

/// A stock that passed both the active filter and the technical gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub quote: Quote,
    pub close: f64,
    pub rsi: f64,
    pub ema20: f64,
    pub score: u8,
    pub volume_ratio: f64,
}

impl Candidate {
    pub fn new(quote: Quote, close: f64, rsi: f64, ema20: f64) -> Self {
        let score = score_candidate(rsi, quote.change_percent);
        let volume_ratio = quote.volume_ratio();
        Self {
            quote,
            close,
            rsi,
            ema20,
            score,
            volume_ratio,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.quote.symbol
    }
}

/// Room to run (RSI below 50) and strong momentum (change above 3%) each
/// score 2 instead of 1.
pub fn score_candidate(rsi: f64, change_percent: f64) -> u8 {
    let rsi_points = if rsi < 50.0 { 2 } else { 1 };
    let change_points = if change_percent > 3.0 { 2 } else { 1 };
    rsi_points + change_points
}

/// Best first: score descending, then volume ratio descending.
pub fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score.cmp(&a.score).then_with(|| {
        b.volume_ratio
            .partial_cmp(&a.volume_ratio)
            .unwrap_or(Ordering::Equal)
    })
}

pub fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(compare_candidates);
}
