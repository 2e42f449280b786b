//! Candlestick reversal heuristics used by the screener

use crate::models::indicators::Candle;
use crate::models::screener::CandlePattern;

/// Pattern found on the latest candle together with a human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternHit {
    pub pattern: CandlePattern,
    pub reason: String,
}

/// Evaluate the latest candle against the reversal patterns.
///
/// Patterns are checked in a fixed priority order and the first hit wins.
/// `ema20` and `rsi` are the latest indicator values for the same history.
pub fn detect_pattern(candles: &[Candle], ema20: f64, rsi: f64) -> Option<PatternHit> {
    let last = candles.last()?;
    let prev = candles.len().checked_sub(2).map(|i| &candles[i]);

    hammer(last, ema20, rsi)
        .or_else(|| shooting_star(last, ema20, rsi))
        .or_else(|| prev.and_then(|p| bullish_engulfing(p, last, rsi)))
        .or_else(|| prev.and_then(|p| bearish_engulfing(p, last, rsi)))
        .or_else(|| oversold_bounce(last, rsi))
}

fn hammer(c: &Candle, ema20: f64, rsi: f64) -> Option<PatternHit> {
    let body = c.body();
    if body == 0.0 {
        return None;
    }
    let lower = c.lower_shadow();
    if lower >= 2.0 * body && c.upper_shadow() <= body && (c.close < ema20 || rsi < 45.0) {
        return Some(PatternHit {
            pattern: CandlePattern::Hammer,
            reason: format!(
                "Lower wick {:.1}x the body after weakness (RSI {:.1}, close {} EMA20)",
                lower / body,
                rsi,
                if c.close < ema20 { "below" } else { "above" }
            ),
        });
    }
    None
}

fn shooting_star(c: &Candle, ema20: f64, rsi: f64) -> Option<PatternHit> {
    let body = c.body();
    if body == 0.0 {
        return None;
    }
    let upper = c.upper_shadow();
    if upper >= 2.0 * body && c.lower_shadow() <= body && (c.close > ema20 || rsi > 55.0) {
        return Some(PatternHit {
            pattern: CandlePattern::ShootingStar,
            reason: format!(
                "Upper wick {:.1}x the body after strength (RSI {:.1}, close {} EMA20)",
                upper / body,
                rsi,
                if c.close > ema20 { "above" } else { "below" }
            ),
        });
    }
    None
}

fn bullish_engulfing(prev: &Candle, c: &Candle, rsi: f64) -> Option<PatternHit> {
    if prev.is_bearish()
        && c.is_bullish()
        && c.open <= prev.close
        && c.close >= prev.open
        && c.body() > prev.body()
        && rsi < 50.0
    {
        return Some(PatternHit {
            pattern: CandlePattern::BullishEngulfing,
            reason: format!("Green body engulfs prior red candle with RSI {:.1}", rsi),
        });
    }
    None
}

fn bearish_engulfing(prev: &Candle, c: &Candle, rsi: f64) -> Option<PatternHit> {
    if prev.is_bullish()
        && c.is_bearish()
        && c.open >= prev.close
        && c.close <= prev.open
        && c.body() > prev.body()
        && rsi > 50.0
    {
        return Some(PatternHit {
            pattern: CandlePattern::BearishEngulfing,
            reason: format!("Red body engulfs prior green candle with RSI {:.1}", rsi),
        });
    }
    None
}

fn oversold_bounce(c: &Candle, rsi: f64) -> Option<PatternHit> {
    if rsi < 30.0 && c.is_bullish() {
        return Some(PatternHit {
            pattern: CandlePattern::OversoldBounce,
            reason: format!("Green close while RSI is oversold at {:.1}", rsi),
        });
    }
    None
}
