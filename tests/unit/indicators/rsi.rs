//! Unit tests for RSI indicator

use candlescope::indicators::momentum::{calculate_rsi, calculate_rsi_default};

use crate::support::{candles_from_closes, create_test_candles};

#[test]
fn test_rsi_needs_period_plus_one_candles() {
    let candles = create_test_candles(14, 100.0, 1.0);
    assert!(calculate_rsi(&candles, 14).is_none());

    let candles = create_test_candles(15, 100.0, 1.0);
    assert!(calculate_rsi(&candles, 14).is_some());
}

#[test]
fn test_rsi_strictly_rising_is_100() {
    let candles = create_test_candles(30, 100.0, 1.0);
    let rsi = calculate_rsi_default(&candles).unwrap();
    assert!((rsi - 100.0).abs() < 1e-9);
}

#[test]
fn test_rsi_strictly_falling_is_0() {
    let candles = create_test_candles(30, 200.0, -1.0);
    let rsi = calculate_rsi_default(&candles).unwrap();
    assert!(rsi.abs() < 1e-9);
}

#[test]
fn test_rsi_flat_is_neutral() {
    let candles = candles_from_closes(&[100.0; 20]);
    assert_eq!(calculate_rsi_default(&candles), Some(50.0));
}

#[test]
fn test_rsi_alternating_moves_balance_out() {
    let closes: Vec<f64> = (0..29)
        .map(|i| if i % 2 == 0 { 100.0 } else { 102.0 })
        .collect();
    let rsi = calculate_rsi(&candles_from_closes(&closes), 14).unwrap();
    assert!(rsi > 40.0 && rsi < 60.0, "rsi = {}", rsi);
}

#[test]
fn test_rsi_stays_in_bounds() {
    let closes: Vec<f64> = (0..80)
        .map(|i| 100.0 + ((i * 37) % 11) as f64 - 5.0)
        .collect();
    let rsi = calculate_rsi(&candles_from_closes(&closes), 14).unwrap();
    assert!((0.0..=100.0).contains(&rsi));
}
