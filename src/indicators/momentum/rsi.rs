//! RSI (Relative Strength Index) indicator

use crate::models::indicators::Candle;

/// Running Wilder averages of gains and losses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WilderAverages {
    pub avg_gain: f64,
    pub avg_loss: f64,
}

impl WilderAverages {
    pub(crate) fn update(&mut self, change: f64, period: usize) {
        let (gain, loss) = split_change(change);
        let n = period as f64;
        self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
        self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
    }

    pub(crate) fn rsi(&self) -> f64 {
        rsi_from_averages(self.avg_gain, self.avg_loss)
    }
}

pub(crate) fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, -change)
    }
}

/// RSI = 100 - (100 / (1 + RS)), RS = average gain / average loss
pub(crate) fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // No losses: fully overbought, unless nothing moved at all.
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Calculate RSI of the latest candle using Wilder's smoothing.
///
/// Needs `period + 1` candles (one price change per period step).
pub fn calculate_rsi(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = candles.windows(2).map(|w| w[1].close - w[0].close).collect();

    let (seed_gain, seed_loss) = changes[..period]
        .iter()
        .map(|&c| split_change(c))
        .fold((0.0, 0.0), |(g, l), (cg, cl)| (g + cg, l + cl));

    let mut averages = WilderAverages {
        avg_gain: seed_gain / period as f64,
        avg_loss: seed_loss / period as f64,
    };
    for &change in &changes[period..] {
        averages.update(change, period);
    }

    Some(averages.rsi())
}

/// Calculate RSI with default period (14)
pub fn calculate_rsi_default(candles: &[Candle]) -> Option<f64> {
    calculate_rsi(candles, 14)
}
