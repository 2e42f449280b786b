use serde::{Deserialize, Serialize};
use std::fmt;

use super::quote::TopMovers;

/// Reversal pattern recognised on the latest candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandlePattern {
    Hammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
    OversoldBounce,
}

impl CandlePattern {
    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            CandlePattern::Hammer | CandlePattern::BullishEngulfing | CandlePattern::OversoldBounce
        )
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CandlePattern::Hammer => "Hammer",
            CandlePattern::ShootingStar => "Shooting Star",
            CandlePattern::BullishEngulfing => "Bullish Engulfing",
            CandlePattern::BearishEngulfing => "Bearish Engulfing",
            CandlePattern::OversoldBounce => "Oversold Bounce",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerMatch {
    pub symbol: String,
    pub price: f64,
    pub pattern: CandlePattern,
    pub reason: String,
    pub rsi: f64,
    pub ema20: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

/// Outcome of one screener pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenerReport {
    pub matches: Vec<ScreenerMatch>,
    pub movers: TopMovers,
    pub scanned: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}
