//! Unit tests for the candlestick reversal heuristics

use candlescope::models::CandlePattern;
use candlescope::signals::detect_pattern;

use crate::support::candle;

#[test]
fn test_hammer_below_ema() {
    let candles = vec![candle(100.0, 101.2, 97.0, 101.0, 1000.0, 0)];
    let hit = detect_pattern(&candles, 105.0, 50.0).unwrap();
    assert_eq!(hit.pattern, CandlePattern::Hammer);
    assert!(hit.pattern.is_bullish());
}

#[test]
fn test_hammer_needs_weakness() {
    // Same shape, but above EMA20 with neutral RSI
    let candles = vec![candle(100.0, 101.2, 97.0, 101.0, 1000.0, 0)];
    assert!(detect_pattern(&candles, 95.0, 50.0).is_none());
}

#[test]
fn test_flat_candle_never_matches_shadow_patterns() {
    let candles = vec![candle(100.0, 100.0, 95.0, 100.0, 1000.0, 0)];
    assert!(detect_pattern(&candles, 110.0, 40.0).is_none());
}

#[test]
fn test_shooting_star_above_ema() {
    let candles = vec![candle(100.0, 103.0, 98.9, 99.0, 1000.0, 0)];
    let hit = detect_pattern(&candles, 95.0, 50.0).unwrap();
    assert_eq!(hit.pattern, CandlePattern::ShootingStar);
    assert!(!hit.pattern.is_bullish());
}

#[test]
fn test_bullish_engulfing() {
    let candles = vec![
        candle(100.0, 100.3, 97.8, 98.0, 1000.0, 0),
        candle(97.5, 101.2, 97.4, 101.0, 1000.0, 1),
    ];
    let hit = detect_pattern(&candles, 99.0, 45.0).unwrap();
    assert_eq!(hit.pattern, CandlePattern::BullishEngulfing);
}

#[test]
fn test_bearish_engulfing() {
    let candles = vec![
        candle(98.0, 100.2, 97.7, 100.0, 1000.0, 0),
        candle(100.5, 100.6, 96.8, 97.0, 1000.0, 1),
    ];
    let hit = detect_pattern(&candles, 99.0, 60.0).unwrap();
    assert_eq!(hit.pattern, CandlePattern::BearishEngulfing);
}

#[test]
fn test_oversold_bounce() {
    let candles = vec![
        candle(99.0, 100.2, 98.8, 100.0, 1000.0, 0),
        candle(100.0, 102.5, 99.5, 102.0, 1000.0, 1),
    ];
    let hit = detect_pattern(&candles, 110.0, 25.0).unwrap();
    assert_eq!(hit.pattern, CandlePattern::OversoldBounce);
}

#[test]
fn test_hammer_outranks_oversold_bounce() {
    let candles = vec![candle(100.0, 101.2, 97.0, 101.0, 1000.0, 0)];
    let hit = detect_pattern(&candles, 105.0, 25.0).unwrap();
    assert_eq!(hit.pattern, CandlePattern::Hammer);
}

#[test]
fn test_empty_history() {
    assert!(detect_pattern(&[], 100.0, 50.0).is_none());
}
