//! Trade plan prompt building, narrative parsing and the mechanical fallback

use serde::Deserialize;
use thiserror::Error;

use crate::common::math::round2;
use crate::models::signal::{PlanSource, TradePlan};

pub const FALLBACK_TARGET_MULTIPLIER: f64 = 1.05;
pub const FALLBACK_STOP_MULTIPLIER: f64 = 0.95;
pub const FALLBACK_CONFIDENCE: f64 = 60.0;

#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("narrative response is empty")]
    Empty,
    #[error("narrative response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("field '{0}' is missing or not a finite positive number")]
    InvalidNumber(&'static str),
    #[error("levels out of order: target {target} > entry {entry} > stop {stop_loss} required")]
    InvalidOrdering {
        entry: f64,
        target: f64,
        stop_loss: f64,
    },
}

/// Facts about the selected stock that go into the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptFacts {
    pub symbol: String,
    pub sector: Option<String>,
    pub price: f64,
    pub change_percent: f64,
    pub volume_ratio: f64,
    pub rsi: f64,
    pub ema20: f64,
}

pub fn build_prompt(facts: &PromptFacts) -> String {
    let sector = facts.sector.as_deref().unwrap_or("Unknown");
    format!(
        "You are a disciplined swing-trading analyst.\n\
         Stock: {symbol} (sector: {sector})\n\
         Last price: {price:.2}\n\
         Change today: {change:.2}%\n\
         Volume vs average: {ratio:.2}x\n\
         RSI(14): {rsi:.1}\n\
         EMA(20): {ema:.2}\n\n\
         Produce a short-term BUY plan. Respond with JSON only, no prose:\n\
         {{\"entry\": number, \"target\": number, \"stopLoss\": number, \
         \"confidence\": number 0-100, \"reason\": string}}",
        symbol = facts.symbol,
        sector = sector,
        price = facts.price,
        change = facts.change_percent,
        ratio = facts.volume_ratio,
        rsi = facts.rsi,
        ema = facts.ema20,
    )
}

/// Extract the JSON object from a narrative response.
///
/// The first markdown fence (```` ``` ```` or ```` ```json ````) wins when
/// present, wherever it starts; the result is then narrowed to the span
/// between the first `{` and the last `}`.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let body = match trimmed.find("```") {
        Some(open) => {
            let rest = &trimmed[open + 3..];
            let inner = match rest.find("```") {
                Some(close) => &rest[..close],
                None => rest,
            };
            // Language tag, if any.
            let tag_len = inner
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(0);
            &inner[tag_len..]
        }
        None => trimmed,
    };
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body.trim(),
    }
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default, alias = "entryPrice", alias = "entry_price")]
    entry: Option<f64>,
    #[serde(default, alias = "targetPrice", alias = "target_price")]
    target: Option<f64>,
    #[serde(default, rename = "stopLoss", alias = "stop_loss", alias = "stop")]
    stop_loss: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "analysis", alias = "summary")]
    reason: Option<String>,
}

fn positive(value: Option<f64>, field: &'static str) -> Result<f64, PlanParseError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(PlanParseError::InvalidNumber(field)),
    }
}

/// Parse an untrusted narrative response into a plan.
///
/// `default_entry` is used when the response has no entry of its own.
/// Confidence given as a fraction (below 1) is scaled to percent.
pub fn parse_trade_plan(raw: &str, default_entry: f64) -> Result<TradePlan, PlanParseError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(PlanParseError::Empty);
    }

    let parsed: RawPlan = serde_json::from_str(body)?;

    let entry = match parsed.entry {
        Some(_) => positive(parsed.entry, "entry")?,
        None => default_entry,
    };
    let target = positive(parsed.target, "target")?;
    let stop_loss = positive(parsed.stop_loss, "stopLoss")?;

    if !(target > entry && entry > stop_loss) {
        return Err(PlanParseError::InvalidOrdering {
            entry,
            target,
            stop_loss,
        });
    }

    let confidence = match parsed.confidence {
        Some(c) if c.is_finite() && c > 0.0 && c < 1.0 => c * 100.0,
        Some(c) if c.is_finite() => c.clamp(0.0, 100.0),
        _ => FALLBACK_CONFIDENCE,
    };

    let reason = parsed
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "Narrative plan without rationale".to_string());

    Ok(TradePlan {
        entry: round2(entry),
        target: round2(target),
        stop_loss: round2(stop_loss),
        confidence,
        reason,
        source: PlanSource::Narrative,
    })
}

/// Mechanical +5% / -5% plan used whenever the narrative is unusable.
pub fn fallback_plan(entry: f64, volume_ratio: f64) -> TradePlan {
    TradePlan {
        entry: round2(entry),
        target: round2(entry * FALLBACK_TARGET_MULTIPLIER),
        stop_loss: round2(entry * FALLBACK_STOP_MULTIPLIER),
        confidence: FALLBACK_CONFIDENCE,
        reason: format!(
            "Volume {:.1}x its average with price holding above EMA20; \
             mechanical plan with 5% target and 5% stop.",
            volume_ratio
        ),
        source: PlanSource::Fallback,
    }
}
