use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{ChartResponse, QuoteResponse, QuoteSummaryResponse};
use crate::config::MarketDataSettings;
use crate::models::indicators::Candle;
use crate::models::quote::{CompanyProfile, Quote};
use crate::services::market_data::MarketDataProvider;
use crate::services::profile::ProfileProvider;

/// REST client for the chart (history), quote and quoteSummary endpoints.
///
/// Transient failures (timeouts, connection errors, 429 and 5xx) are retried
/// with exponential backoff; everything else surfaces immediately.
pub struct YahooMarketDataProvider {
    base_url: String,
    client: reqwest::Client,
    max_retries: usize,
}

impl YahooMarketDataProvider {
    pub fn new(settings: MarketDataSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; candlescope/0.1)")
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self::with_client(settings.base_url, client, settings.max_retries))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client, max_retries: usize) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            max_retries,
        }
    }

    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, reqwest::Error> {
        let request = move || async move {
            self.client
                .get(url)
                .query(query)
                .send()
                .await?
                .error_for_status()?
                .json::<T>()
                .await
        };

        request
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(250))
                    .with_max_times(self.max_retries),
            )
            .when(is_transient)
            .notify(|e: &reqwest::Error, after: Duration| {
                warn!(url = %url, error = %e, "Market data request failed, retrying in {:?}", after);
            })
            .await
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    if e.is_timeout() || e.is_connect() {
        return true;
    }
    e.status()
        .map(|s| s.is_server_error() || s.as_u16() == 429)
        .unwrap_or(false)
}

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// Convert a chart response into candles, dropping sessions with any `null` field.
pub(crate) fn candles_from_chart(
    symbol: &str,
    response: ChartResponse,
) -> Result<Vec<Candle>, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(err) = response.chart.error {
        return Err(invalid_data(format!("Chart error for {}: {}", symbol, err)));
    }
    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let Some(series) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();
    let mut candles = Vec::with_capacity(result.timestamp.len());

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let fields = (
            at(&series.open, i),
            at(&series.high, i),
            at(&series.low, i),
            at(&series.close, i),
            at(&series.volume, i),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = fields else {
            continue;
        };
        let Some(time) = DateTime::from_timestamp(ts + offset, 0) else {
            continue;
        };
        candles.push(Candle::new(open, high, low, close, volume, time.date_naive()));
    }

    candles.sort_by_key(|c| c.time);
    candles.dedup_by_key(|c| c.time);
    Ok(candles)
}

#[async_trait]
impl MarketDataProvider for YahooMarketDataProvider {
    async fn get_quotes(
        &self,
        symbols: &[String],
    ) -> Result<Vec<Quote>, Box<dyn std::error::Error + Send + Sync>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v7/finance/quote", self.base_url);
        let response: QuoteResponse = self
            .get_json(&url, &[("symbols", symbols.join(","))])
            .await?;

        if let Some(err) = response.quote_response.error {
            return Err(invalid_data(format!("Quote error: {}", err)));
        }

        let quotes: Vec<Quote> = response
            .quote_response
            .result
            .into_iter()
            .filter_map(|item| {
                let price = item.regular_market_price?;
                Some(Quote {
                    symbol: item.symbol,
                    price,
                    change_percent: item.regular_market_change_percent.unwrap_or(0.0),
                    volume: item.regular_market_volume.unwrap_or(0.0),
                    avg_volume: item
                        .average_daily_volume3_month
                        .or(item.average_daily_volume10_day)
                        .unwrap_or(0.0),
                })
            })
            .collect();

        if quotes.len() < symbols.len() {
            debug!(
                requested = symbols.len(),
                received = quotes.len(),
                "Quote snapshot is partial: {} of {} symbols",
                quotes.len(),
                symbols.len()
            );
        }

        Ok(quotes)
    }

    async fn get_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<Candle>, Box<dyn std::error::Error + Send + Sync>> {
        let now = Utc::now();
        let start = now - ChronoDuration::days(i64::from(lookback_days));
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let response: ChartResponse = self
            .get_json(
                &url,
                &[
                    ("period1", start.timestamp().to_string()),
                    ("period2", now.timestamp().to_string()),
                    ("interval", "1d".to_string()),
                ],
            )
            .await?;

        let candles = candles_from_chart(symbol, response)?;
        debug!(symbol = %symbol, count = candles.len(), "Fetched {} candles for {}", candles.len(), symbol);
        Ok(candles)
    }
}

#[async_trait]
impl ProfileProvider for YahooMarketDataProvider {
    async fn get_profile(
        &self,
        symbol: &str,
    ) -> Result<CompanyProfile, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let response: QuoteSummaryResponse = self
            .get_json(&url, &[("modules", "assetProfile".to_string())])
            .await?;

        if let Some(err) = response.quote_summary.error {
            return Err(invalid_data(format!("Profile error for {}: {}", symbol, err)));
        }

        let profile = response
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .and_then(|r| r.asset_profile);

        Ok(CompanyProfile {
            symbol: symbol.to_string(),
            sector: profile.as_ref().and_then(|p| p.sector.clone()),
            industry: profile.and_then(|p| p.industry),
        })
    }
}
