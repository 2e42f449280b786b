//! Lazily computed per-candle indicator snapshots

use crate::common::math;
use crate::indicators::momentum::rsi::{split_change, WilderAverages};
use crate::indicators::strength::candle_strength;
use crate::models::indicators::{Candle, IndicatorPeriods, IndicatorSnapshot};

/// Iterator yielding one [`IndicatorSnapshot`] per candle.
///
/// State is carried forward incrementally so walking the whole history is
/// linear. Values agree with the batch functions evaluated on the prefix
/// ending at the same index.
pub struct IndicatorSeries<'a> {
    candles: &'a [Candle],
    periods: IndicatorPeriods,
    index: usize,
    sma_sum: f64,
    ema_seed_sum: f64,
    ema: Option<f64>,
    rsi_seed: (f64, f64),
    rsi: Option<WilderAverages>,
}

impl<'a> IndicatorSeries<'a> {
    pub fn new(candles: &'a [Candle], periods: IndicatorPeriods) -> Self {
        Self {
            candles,
            periods,
            index: 0,
            sma_sum: 0.0,
            ema_seed_sum: 0.0,
            ema: None,
            rsi_seed: (0.0, 0.0),
            rsi: None,
        }
    }

    fn next_sma(&mut self, close: f64) -> Option<f64> {
        let period = self.periods.sma;
        if period == 0 {
            return None;
        }
        self.sma_sum += close;
        if self.index >= period {
            self.sma_sum -= self.candles[self.index - period].close;
        }
        (self.index + 1 >= period).then(|| self.sma_sum / period as f64)
    }

    fn next_ema(&mut self, close: f64) -> Option<f64> {
        let period = self.periods.ema;
        if period == 0 {
            return None;
        }
        let count = self.index + 1;
        if count < period {
            self.ema_seed_sum += close;
        } else if count == period {
            self.ema_seed_sum += close;
            self.ema = Some(self.ema_seed_sum / period as f64);
        } else {
            self.ema = self
                .ema
                .map(|prev| math::ema_from_previous(close, prev, period));
        }
        self.ema
    }

    fn next_rsi(&mut self, close: f64) -> Option<f64> {
        let period = self.periods.rsi;
        if period == 0 || self.index == 0 {
            return None;
        }
        let change = close - self.candles[self.index - 1].close;
        let steps = self.index;

        if steps <= period {
            let (gain, loss) = split_change(change);
            self.rsi_seed.0 += gain;
            self.rsi_seed.1 += loss;
            if steps == period {
                self.rsi = Some(WilderAverages {
                    avg_gain: self.rsi_seed.0 / period as f64,
                    avg_loss: self.rsi_seed.1 / period as f64,
                });
            }
        } else if let Some(averages) = self.rsi.as_mut() {
            averages.update(change, period);
        }

        self.rsi.map(|a| a.rsi())
    }
}

impl Iterator for IndicatorSeries<'_> {
    type Item = IndicatorSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        let candle = self.candles.get(self.index)?;
        let close = candle.close;

        let snapshot = IndicatorSnapshot {
            time: candle.time,
            close,
            sma: self.next_sma(close),
            ema: self.next_ema(close),
            rsi: self.next_rsi(close),
            strength: candle_strength(candle),
        };

        self.index += 1;
        Some(snapshot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.candles.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndicatorSeries<'_> {}

/// Snapshot of the latest candle, or `None` for an empty history.
pub fn latest_snapshot(candles: &[Candle], periods: IndicatorPeriods) -> Option<IndicatorSnapshot> {
    IndicatorSeries::new(candles, periods).last()
}
