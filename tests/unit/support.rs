//! Candle builders and in-memory collaborators shared by the unit tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use candlescope::config::EngineConfig;
use candlescope::db::InMemorySignalStore;
use candlescope::engine::Engine;
use candlescope::models::{Candle, Quote};
use candlescope::services::{MarketDataProvider, NarrativeGenerator, Notifier};

pub fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset as i64)
}

pub fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64, offset: usize) -> Candle {
    Candle::new(open, high, low, close, volume, day(offset))
}

/// Steadily rising closes, `step` apart, with a 0.5 wick either side.
pub fn create_test_candles(count: usize, base_price: f64, step: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = base_price + i as f64 * step;
            let open = close - step;
            candle(open, open.max(close) + 0.5, open.min(close) - 0.5, close, 1000.0, i)
        })
        .collect()
}

/// Candles built from closes only: open = previous close.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            candle(open, open.max(close) + 0.5, open.min(close) - 0.5, close, 1000.0, i)
        })
        .collect()
}

/// `count` quiet candles: open = close = 100, range 99..101, volume 1000.
pub fn flat_candles(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| candle(100.0, 101.0, 99.0, 100.0, 1000.0, i))
        .collect()
}

pub fn quote(symbol: &str, price: f64, change_percent: f64, volume: f64, avg_volume: f64) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        price,
        change_percent,
        volume,
        avg_volume,
    }
}

/// Market data served from maps; symbols listed in `failing` return errors.
#[derive(Default)]
pub struct FakeMarketData {
    pub quotes: Mutex<Vec<Quote>>,
    pub history: Mutex<HashMap<String, Vec<Candle>>>,
    pub failing: Mutex<HashSet<String>>,
    pub fail_quotes: Mutex<bool>,
    pub history_calls: AtomicUsize,
}

impl FakeMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(self, q: Quote) -> Self {
        self.quotes.lock().unwrap().push(q);
        self
    }

    pub fn with_history(self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.history.lock().unwrap().insert(symbol.to_string(), candles);
        self
    }

    pub fn failing_for(self, symbol: &str) -> Self {
        self.failing.lock().unwrap().insert(symbol.to_string());
        self
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        let mut quotes = self.quotes.lock().unwrap();
        match quotes.iter_mut().find(|q| q.symbol == symbol) {
            Some(q) => q.price = price,
            None => quotes.push(quote(symbol, price, 0.0, 0.0, 0.0)),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarketData {
    async fn get_quotes(
        &self,
        symbols: &[String],
    ) -> Result<Vec<Quote>, Box<dyn std::error::Error + Send + Sync>> {
        if *self.fail_quotes.lock().unwrap() {
            return Err("quote endpoint down".into());
        }
        let quotes = self.quotes.lock().unwrap();
        Ok(quotes
            .iter()
            .filter(|q| symbols.contains(&q.symbol))
            .cloned()
            .collect())
    }

    async fn get_history(
        &self,
        symbol: &str,
        _lookback_days: u32,
    ) -> Result<Vec<Candle>, Box<dyn std::error::Error + Send + Sync>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(symbol) {
            return Err(format!("history unavailable for {}", symbol).into());
        }
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }
}

/// Narrative collaborator returning a canned response and counting calls.
pub struct FakeNarrator {
    pub response: Result<String, String>,
    pub calls: AtomicUsize,
}

impl FakeNarrator {
    pub fn replying(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err("narrative service unavailable".to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrativeGenerator for FakeNarrator {
    async fn generate_plan(
        &self,
        _prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(|e| e.into())
    }
}

/// Records every broadcast. A hanging notifier records the call and then
/// never completes.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, Value)>>,
    pub fail: bool,
    pub hang: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(t, _, _)| t.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn broadcast(
        &self,
        title: &str,
        body: &str,
        metadata: &Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string(), metadata.clone()));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err("telegram down".into());
        }
        Ok(())
    }
}

/// Engine config for tests: no pacing between calls.
pub fn test_config(universe: &[&str]) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.universe = universe.iter().map(|s| s.to_string()).collect();
    config.watchlist = config.universe.clone();
    config.throttle.min_interval = std::time::Duration::ZERO;
    config
}

pub struct TestEngine {
    pub engine: Engine,
    pub market: Arc<FakeMarketData>,
    pub store: Arc<InMemorySignalStore>,
    pub narrator: Arc<FakeNarrator>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestEngine {
    pub fn new(
        config: EngineConfig,
        market: FakeMarketData,
        store: InMemorySignalStore,
        narrator: FakeNarrator,
        notifier: RecordingNotifier,
    ) -> Self {
        let market = Arc::new(market);
        let store = Arc::new(store);
        let narrator = Arc::new(narrator);
        let notifier = Arc::new(notifier);
        let engine = Engine::new(
            config,
            market.clone(),
            store.clone(),
            narrator.clone(),
            notifier.clone(),
        );
        Self {
            engine,
            market,
            store,
            narrator,
            notifier,
        }
    }
}

/// Uptrend alternating +3 / -2 moves, ending on an up move. RSI settles
/// around 60 and the last close sits above EMA20.
pub fn trending_history(count: usize, start: f64) -> Vec<Candle> {
    let mut closes = Vec::with_capacity(count);
    let mut price = start;
    for i in 0..count {
        // Walk backwards from the end so the last move is always up
        let steps_from_end = count - 1 - i;
        if i > 0 {
            price += if steps_from_end % 2 == 0 { 3.0 } else { -2.0 };
        }
        closes.push(price);
    }
    candles_from_closes(&closes)
}

/// Falling closes from `start`, one point a day.
pub fn falling_history(count: usize, start: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..count).map(|i| start - i as f64).collect();
    candles_from_closes(&closes)
}
