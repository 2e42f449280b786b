//! Candle strength: where the close sits within the day's range

use crate::models::indicators::Candle;

/// `(close - open) / (high - low)`.
///
/// A candle with no intraday range uses a denominator of 1, so a flat or
/// limit-locked candle yields the raw price delta.
pub fn candle_strength(candle: &Candle) -> f64 {
    let range = candle.high - candle.low;
    let denominator = if range == 0.0 { 1.0 } else { range };
    (candle.close - candle.open) / denominator
}

