//! Market data provider interface.

use async_trait::async_trait;

use crate::models::indicators::Candle;
use crate::models::quote::Quote;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Current quotes for `symbols`.
    ///
    /// Symbols the source knows nothing about are simply absent from the
    /// result; partial answers are not an error.
    async fn get_quotes(
        &self,
        symbols: &[String],
    ) -> Result<Vec<Quote>, Box<dyn std::error::Error + Send + Sync>>;

    /// Daily candles covering the last `lookback_days` calendar days, oldest first.
    async fn get_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<Candle>, Box<dyn std::error::Error + Send + Sync>>;

    /// Latest traded price, `None` when the source has no quote for `symbol`.
    async fn get_latest_price(
        &self,
        symbol: &str,
    ) -> Result<Option<f64>, Box<dyn std::error::Error + Send + Sync>> {
        let quotes = self.get_quotes(&[symbol.to_string()]).await?;
        Ok(quotes
            .into_iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
            .map(|q| q.price))
    }
}
