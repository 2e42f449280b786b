//! SMA (Simple Moving Average) indicator

use crate::common::math;
use crate::models::indicators::Candle;

/// Mean of the last `period` closes, or `None` with fewer than `period` candles.
pub fn calculate_sma(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }
    let closes: Vec<f64> = candles[candles.len() - period..]
        .iter()
        .map(|c| c.close)
        .collect();
    math::sma(&closes, period)
}

