//! Unit tests for the activity detector

use candlescope::models::ActivityLabel;
use candlescope::signals::{detect_activity, ActivityDetector, DetectorConfig};

use crate::support::{candle, day, flat_candles};

#[test]
fn test_big_buy_on_heavy_green_candle() {
    let mut candles = flat_candles(20);
    candles.push(candle(100.0, 112.0, 98.0, 110.0, 3000.0, 20));

    let signals = detect_activity(&candles);
    assert_eq!(signals.len(), 1);
    let signal = &signals[0];
    assert_eq!(signal.date, day(20));
    assert!(signal.has(ActivityLabel::BigBuy));
    assert!(!signal.has(ActivityLabel::BigSell));
    assert!((signal.avg_volume - 1000.0).abs() < 1e-9);
}

#[test]
fn test_big_sell_on_heavy_red_candle() {
    let mut candles = flat_candles(20);
    candles.push(candle(100.0, 102.0, 88.0, 90.0, 3000.0, 20));

    let signals = detect_activity(&candles);
    assert_eq!(signals.len(), 1);
    assert!(signals[0].has(ActivityLabel::BigSell));
    assert!(!signals[0].has(ActivityLabel::BigBuy));
}

#[test]
fn test_flat_close_on_heavy_volume_gets_no_label() {
    let mut candles = flat_candles(20);
    candles.push(candle(100.0, 101.0, 99.0, 100.0, 5000.0, 20));

    assert!(detect_activity(&candles).is_empty());
}

#[test]
fn test_no_signals_within_first_window() {
    let mut candles = flat_candles(30);
    // Huge breakout-looking candle before a full window exists
    candles[5] = candle(100.0, 131.0, 99.0, 130.0, 50_000.0, 5);

    let signals = detect_activity(&candles);
    assert!(signals.iter().all(|s| s.date >= day(20)));
    assert!(!signals.iter().any(|s| s.has(ActivityLabel::Breakout)));
}

#[test]
fn test_breakout_above_prior_high_on_elevated_volume() {
    let mut candles = flat_candles(20);
    candles.push(candle(100.0, 103.5, 99.5, 103.0, 1600.0, 20));

    let signals = detect_activity(&candles);
    assert_eq!(signals.len(), 1);
    let labels = &signals[0].signals;
    assert!(labels.contains(&ActivityLabel::Breakout));
    assert!(labels.contains(&ActivityLabel::StrongBullish));
    assert!(!labels.contains(&ActivityLabel::BigBuy));
}

#[test]
fn test_breakout_requires_volume() {
    let mut candles = flat_candles(20);
    candles.push(candle(100.0, 103.5, 99.5, 103.0, 1200.0, 20));

    let signals = detect_activity(&candles);
    assert!(signals.iter().all(|s| !s.has(ActivityLabel::Breakout)));
}

#[test]
fn test_custom_window() {
    let detector = ActivityDetector::new(DetectorConfig {
        window: 5,
        ..DetectorConfig::default()
    });
    let mut candles = flat_candles(5);
    candles.push(candle(100.0, 112.0, 98.0, 110.0, 3000.0, 5));

    let signals = detector.detect(&candles);
    assert_eq!(signals.len(), 1);
    assert!(signals[0].has(ActivityLabel::BigBuy));
}

#[test]
fn test_labels_serialize_with_spaces() {
    let json = serde_json::to_string(&ActivityLabel::BigBuy).unwrap();
    assert_eq!(json, "\"BIG BUY\"");
}
