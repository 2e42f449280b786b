use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label attached to a candle by the activity detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityLabel {
    #[serde(rename = "BIG BUY")]
    BigBuy,
    #[serde(rename = "BIG SELL")]
    BigSell,
    #[serde(rename = "STRONG BULLISH")]
    StrongBullish,
    #[serde(rename = "STRONG BEARISH")]
    StrongBearish,
    #[serde(rename = "BREAKOUT")]
    Breakout,
}

impl ActivityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLabel::BigBuy => "BIG BUY",
            ActivityLabel::BigSell => "BIG SELL",
            ActivityLabel::StrongBullish => "STRONG BULLISH",
            ActivityLabel::StrongBearish => "STRONG BEARISH",
            ActivityLabel::Breakout => "BREAKOUT",
        }
    }
}

impl fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candle that tripped at least one detection rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySignal {
    pub date: NaiveDate,
    pub volume: f64,
    #[serde(rename = "avgVol")]
    pub avg_volume: f64,
    pub strength: f64,
    pub signals: Vec<ActivityLabel>,
}

impl ActivitySignal {
    pub fn has(&self, label: ActivityLabel) -> bool {
        self.signals.contains(&label)
    }
}
