//! Shared data models spanning the engine layers.

pub mod activity;
pub mod indicators;
pub mod quote;
pub mod screener;
pub mod signal;

pub use activity::{ActivityLabel, ActivitySignal};
pub use indicators::{Candle, IndicatorPeriods, IndicatorSnapshot};
pub use quote::{CompanyProfile, Quote, TopMovers};
pub use screener::{CandlePattern, ScreenerMatch, ScreenerReport};
pub use signal::{
    DailySignal, NewSignal, PlanSource, SignalAction, SignalStatus, TradePlan, CASH_SYMBOL,
};
