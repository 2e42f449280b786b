//! Plain slice math used by the indicator library.

/// Mean of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Smoothing factor for an EMA of `period`.
pub fn ema_alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// One EMA step from the previous value.
pub fn ema_from_previous(value: f64, previous: f64, period: usize) -> f64 {
    let k = ema_alpha(period);
    value * k + previous * (1.0 - k)
}

/// EMA over the whole slice, seeded with the SMA of the first `period` values.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    Some(
        values[period..]
            .iter()
            .fold(seed, |prev, &v| ema_from_previous(v, prev, period)),
    )
}

/// Round to two decimals (price precision).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
