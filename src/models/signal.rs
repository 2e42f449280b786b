use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbol stored on WAIT records.
pub const CASH_SYMBOL: &str = "CASH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Wait,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
            SignalAction::Wait => "WAIT",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(SignalAction::Buy),
            "SELL" => Ok(SignalAction::Sell),
            "WAIT" => Ok(SignalAction::Wait),
            other => Err(format!("unknown signal action '{}'", other)),
        }
    }
}

/// Lifecycle state of a stored signal.
///
/// `HitTp` and `HitSl` are terminal; only the monitor moves a signal into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Open,
    Wait,
    HitTp,
    HitSl,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Open => "OPEN",
            SignalStatus::Wait => "WAIT",
            SignalStatus::HitTp => "HIT_TP",
            SignalStatus::HitSl => "HIT_SL",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SignalStatus::HitTp | SignalStatus::HitSl)
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(SignalStatus::Open),
            "WAIT" => Ok(SignalStatus::Wait),
            "HIT_TP" => Ok(SignalStatus::HitTp),
            "HIT_SL" => Ok(SignalStatus::HitSl),
            other => Err(format!("unknown signal status '{}'", other)),
        }
    }
}

/// Where a trade plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanSource {
    Narrative,
    Fallback,
}

/// Entry, exits and rationale for a BUY signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub entry: f64,
    pub target: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    pub reason: String,
    pub source: PlanSource,
}

/// A signal ready to be persisted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSignal {
    pub symbol: String,
    pub action: SignalAction,
    pub entry_price: Option<f64>,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub ai_confidence: Option<f64>,
    pub analysis_summary: String,
    pub status: SignalStatus,
    pub created_at: DateTime<Utc>,
}

impl NewSignal {
    /// Open BUY signal built from a trade plan.
    pub fn buy(symbol: impl Into<String>, plan: &TradePlan, created_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            action: SignalAction::Buy,
            entry_price: Some(plan.entry),
            target_price: Some(plan.target),
            stop_loss: Some(plan.stop_loss),
            ai_confidence: Some(plan.confidence),
            analysis_summary: plan.reason.clone(),
            status: SignalStatus::Open,
            created_at,
        }
    }

    /// "Stay in cash" record; carries only a summary.
    pub fn wait(summary: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            symbol: CASH_SYMBOL.to_string(),
            action: SignalAction::Wait,
            entry_price: None,
            target_price: None,
            stop_loss: None,
            ai_confidence: None,
            analysis_summary: summary.into(),
            status: SignalStatus::Wait,
            created_at,
        }
    }

    pub fn into_signal(self, id: i64) -> DailySignal {
        DailySignal {
            id,
            symbol: self.symbol,
            action: self.action,
            entry_price: self.entry_price,
            target_price: self.target_price,
            stop_loss: self.stop_loss,
            ai_confidence: self.ai_confidence,
            analysis_summary: self.analysis_summary,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Persisted daily signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySignal {
    pub id: i64,
    pub symbol: String,
    pub action: SignalAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_confidence: Option<f64>,
    pub analysis_summary: String,
    pub status: SignalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailySignal {
    pub fn is_cash(&self) -> bool {
        self.action == SignalAction::Wait || self.symbol == CASH_SYMBOL
    }
}
