use serde::{Deserialize, Serialize};

/// Current market snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub avg_volume: f64,
}

impl Quote {
    /// Today's volume relative to the average; 0 when no average is known.
    pub fn volume_ratio(&self) -> f64 {
        if self.avg_volume > 0.0 {
            self.volume / self.avg_volume
        } else {
            0.0
        }
    }
}

/// Top gainers and losers from one quote snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopMovers {
    pub gainers: Vec<Quote>,
    pub losers: Vec<Quote>,
}

/// Company metadata used to enrich screener output and prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}
