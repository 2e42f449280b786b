//! Yahoo Finance style chart/quote/quoteSummary endpoints

mod client;
pub mod types;

pub use client::YahooMarketDataProvider;
