//! Volume anomaly and breakout detection ("broker activity")

use std::collections::VecDeque;

use crate::indicators::strength::candle_strength;
use crate::models::activity::{ActivityLabel, ActivitySignal};
use crate::models::indicators::Candle;

/// Thresholds for the activity rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Number of prior volumes averaged, and prior highs scanned for breakouts
    pub window: usize,
    pub big_volume_multiplier: f64,
    pub strength_threshold: f64,
    pub breakout_volume_multiplier: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window: 20,
            big_volume_multiplier: 2.0,
            strength_threshold: 0.6,
            breakout_volume_multiplier: 1.5,
        }
    }
}

pub struct ActivityDetector {
    config: DetectorConfig,
}

impl ActivityDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Scan a chronological history and return one entry per candle that
    /// fired at least one labelled rule.
    ///
    /// Candles with fewer than `window` prior volume samples are skipped.
    pub fn detect(&self, candles: &[Candle]) -> Vec<ActivitySignal> {
        let window = self.config.window;
        if window == 0 {
            return Vec::new();
        }

        let mut volumes: VecDeque<f64> = VecDeque::with_capacity(window + 1);
        let mut detected = Vec::new();

        for (i, candle) in candles.iter().enumerate() {
            if volumes.len() == window {
                let avg_volume = volumes.iter().sum::<f64>() / window as f64;
                let prior_high = candles[i - window..i]
                    .iter()
                    .map(|c| c.high)
                    .fold(f64::NEG_INFINITY, f64::max);

                if let Some(signal) = self.evaluate(candle, avg_volume, prior_high) {
                    detected.push(signal);
                }
            }

            volumes.push_back(candle.volume);
            if volumes.len() > window {
                volumes.pop_front();
            }
        }

        detected
    }

    fn evaluate(&self, candle: &Candle, avg_volume: f64, prior_high: f64) -> Option<ActivitySignal> {
        let strength = candle_strength(candle);
        let mut labels = Vec::new();

        // A flat close on heavy volume carries no direction and gets no label.
        if candle.volume > self.config.big_volume_multiplier * avg_volume {
            if candle.is_bullish() {
                labels.push(ActivityLabel::BigBuy);
            } else if candle.is_bearish() {
                labels.push(ActivityLabel::BigSell);
            }
        }

        if strength > self.config.strength_threshold {
            labels.push(ActivityLabel::StrongBullish);
        } else if strength < -self.config.strength_threshold {
            labels.push(ActivityLabel::StrongBearish);
        }

        if candle.close > prior_high
            && candle.volume > self.config.breakout_volume_multiplier * avg_volume
        {
            labels.push(ActivityLabel::Breakout);
        }

        if labels.is_empty() {
            return None;
        }

        Some(ActivitySignal {
            date: candle.time,
            volume: candle.volume,
            avg_volume,
            strength,
            signals: labels,
        })
    }
}

impl Default for ActivityDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

/// Run the detector with default thresholds.
pub fn detect_activity(candles: &[Candle]) -> Vec<ActivitySignal> {
    ActivityDetector::default().detect(candles)
}
