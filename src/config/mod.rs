//! Environment-driven configuration.
//!
//! Binaries call `dotenvy::dotenv()` first, so every value here can also come
//! from a `.env` file.

use std::env;
use std::time::Duration;

use crate::signals::activity::DetectorConfig;
use crate::signals::scoring::{ActiveFilter, TechnicalGate};

/// Liquid IDX names scanned by the daily signal generator.
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "BBCA.JK", "BBRI.JK", "BMRI.JK", "BBNI.JK", "BRIS.JK", "TLKM.JK", "ASII.JK", "UNVR.JK",
    "ICBP.JK", "INDF.JK", "KLBF.JK", "CPIN.JK", "JPFA.JK", "MYOR.JK", "GGRM.JK", "HMSP.JK",
    "UNTR.JK", "ADRO.JK", "PTBA.JK", "ITMG.JK", "MEDC.JK", "PGAS.JK", "AKRA.JK", "ANTM.JK",
    "INCO.JK", "MDKA.JK", "TINS.JK", "SMGR.JK", "INTP.JK", "WIKA.JK", "PTPP.JK", "JSMR.JK",
    "BSDE.JK", "CTRA.JK", "PWON.JK", "SMRA.JK", "EXCL.JK", "ISAT.JK", "TOWR.JK", "TBIG.JK",
    "MAPI.JK", "ACES.JK", "ERAA.JK", "AMRT.JK", "SIDO.JK", "HEAL.JK", "MIKA.JK", "ESSA.JK",
    "BUKA.JK", "GOTO.JK",
];

/// Symbols the screener scans for reversal patterns.
pub const DEFAULT_WATCHLIST: &[&str] = &[
    "BBCA.JK", "BBRI.JK", "BMRI.JK", "BBNI.JK", "TLKM.JK", "ASII.JK", "UNVR.JK", "ICBP.JK",
    "KLBF.JK", "ADRO.JK", "PTBA.JK", "ANTM.JK", "MDKA.JK", "UNTR.JK", "AMRT.JK", "GOTO.JK",
];

pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn get_questdb_url() -> String {
    env::var("QUESTDB_URL")
        .unwrap_or_else(|_| "host=localhost port=8812 user=admin password=quest dbname=qdb".to_string())
}

pub fn get_redis_url() -> String {
    env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_list(key: &str) -> Option<Vec<String>> {
    let list: Vec<String> = env::var(key)
        .ok()?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

/// Throttle applied to calls against the market-data source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleConfig {
    pub max_concurrency: usize,
    pub min_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            min_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Cron expressions (with seconds) for the worker's passes, evaluated in UTC.
///
/// The IDX regular session is 09:00-16:00 WIB (UTC+7), i.e. 02:00-09:00 UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub generate_cron: String,
    pub monitor_cron: String,
    pub scan_cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            // 16:30 WIB, after the close
            generate_cron: "0 30 9 * * Mon-Fri".to_string(),
            // Every 15 minutes from the open until 16:45 WIB
            monitor_cron: "0 */15 2-9 * * Mon-Fri".to_string(),
            // 18:00 WIB
            scan_cron: "0 0 11 * * Mon-Fri".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub universe: Vec<String>,
    pub watchlist: Vec<String>,
    pub history_lookback_days: u32,
    pub min_history: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub top_movers: usize,
    pub active_filter: ActiveFilter,
    pub technical_gate: TechnicalGate,
    pub detector: DetectorConfig,
    pub throttle: ThrottleConfig,
    pub schedule: ScheduleConfig,
    pub profile_ttl: Duration,
    pub lock_ttl: Duration,
    pub wait_summary: String,
    /// WAIT summary when the quote snapshot itself could not be fetched.
    pub outage_summary: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            watchlist: DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
            history_lookback_days: 100,
            min_history: 50,
            ema_period: 20,
            rsi_period: 14,
            top_movers: 5,
            active_filter: ActiveFilter::default(),
            technical_gate: TechnicalGate::default(),
            detector: DetectorConfig::default(),
            throttle: ThrottleConfig::default(),
            schedule: ScheduleConfig::default(),
            profile_ttl: Duration::from_secs(24 * 60 * 60),
            lock_ttl: Duration::from_secs(60),
            wait_summary: "No stock passed the trend and momentum filters today. \
                           Staying in cash until a cleaner setup appears."
                .to_string(),
            outage_summary: "Market data was unavailable today, so no stock could be \
                             evaluated. Staying in cash."
                .to_string(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by whatever is set in the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(universe) = env_list("UNIVERSE") {
            config.universe = universe;
        }
        if let Some(watchlist) = env_list("WATCHLIST") {
            config.watchlist = watchlist;
        }
        if let Some(days) = env_parse("HISTORY_LOOKBACK_DAYS") {
            config.history_lookback_days = days;
        }
        if let Some(min) = env_parse("MIN_HISTORY") {
            config.min_history = min;
        }
        if let Some(n) = env_parse("TOP_MOVERS") {
            config.top_movers = n;
        }
        if let Some(price) = env_parse("MIN_PRICE") {
            config.active_filter.min_price = price;
        }
        if let Some(concurrency) = env_parse::<usize>("FETCH_CONCURRENCY") {
            // Stay well under the data source's rate limit.
            config.throttle.max_concurrency = concurrency.clamp(1, 5);
        }
        if let Some(ms) = env_parse("FETCH_INTERVAL_MS") {
            config.throttle.min_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse("REQUEST_TIMEOUT_SECONDS") {
            config.throttle.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(cron) = env::var("GENERATE_CRON") {
            config.schedule.generate_cron = cron;
        }
        if let Ok(cron) = env::var("MONITOR_CRON") {
            config.schedule.monitor_cron = cron;
        }
        if let Ok(cron) = env::var("SCAN_CRON") {
            config.schedule.scan_cron = cron;
        }
        if let Some(secs) = env_parse("PROFILE_TTL_SECONDS") {
            config.profile_ttl = Duration::from_secs(secs);
        }

        config
    }
}

/// Endpoint and credentials of the market-data source.
#[derive(Debug, Clone)]
pub struct MarketDataSettings {
    pub base_url: String,
    pub max_retries: usize,
}

impl MarketDataSettings {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("MARKET_DATA_URL")
                .unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string()),
            max_retries: env_parse("MARKET_DATA_RETRIES").unwrap_or(3),
        }
    }
}

/// Chat-completion endpoint used for trade plan narratives.
#[derive(Debug, Clone)]
pub struct NarrativeSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl NarrativeSettings {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("NARRATIVE_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            api_key: env::var("NARRATIVE_API_KEY").ok(),
            model: env::var("NARRATIVE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        }
    }
}

/// Telegram credentials; `None` when notifications are log-only.
#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub base_url: String,
    pub token: String,
    pub chat_id: String,
}

impl TelegramSettings {
    pub fn from_env() -> Option<Self> {
        let token = env::var("TELEGRAM_TOKEN").ok()?;
        let chat_id = env::var("TELEGRAM_CHAT_ID").ok()?;
        Some(Self {
            base_url: env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            token,
            chat_id,
        })
    }
}
