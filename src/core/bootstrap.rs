//! Wiring of the engine's collaborators from the environment

use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::SystemClock;
use crate::config::{self, EngineConfig, MarketDataSettings, NarrativeSettings, TelegramSettings};
use crate::core::lock::{RedisRunLock, RunLock};
use crate::db::{InMemorySignalStore, QuestDatabase, SignalStore};
use crate::engine::Engine;
use crate::metrics::Metrics;
use crate::services::{
    CachedProfileService, ChatCompletionNarrator, LogNotifier, Notifier, TelegramNotifier,
    YahooMarketDataProvider,
};

/// Which stores the binary insists on.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapOptions {
    /// Fail instead of falling back to the in-memory store.
    pub require_database: bool,
    /// Use the in-memory store without trying QuestDB.
    pub in_memory: bool,
    /// Share run locks through Redis instead of keeping them in-process.
    pub redis_locks: bool,
}

pub async fn build_engine(
    config: EngineConfig,
    metrics: Arc<Metrics>,
    options: BootstrapOptions,
) -> Result<Engine, Box<dyn std::error::Error + Send + Sync>> {
    let market = Arc::new(YahooMarketDataProvider::new(MarketDataSettings::from_env())?);

    let store: Arc<dyn SignalStore> = if options.in_memory {
        info!("Using in-memory signal store");
        Arc::new(InMemorySignalStore::new())
    } else {
        match QuestDatabase::new().await {
            Ok(db) => {
                info!("QuestDB connected");
                metrics.database_connected.set(1.0);
                Arc::new(db)
            }
            Err(e) if options.require_database => {
                return Err(format!("QuestDB connection required: {}", e).into());
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect to QuestDB, signals will not outlive this process");
                Arc::new(InMemorySignalStore::new())
            }
        }
    };

    let notifier: Arc<dyn Notifier> = match TelegramSettings::from_env() {
        Some(settings) => {
            info!("Telegram notifications enabled");
            Arc::new(TelegramNotifier::new(settings)?)
        }
        None => {
            info!("TELEGRAM_TOKEN/TELEGRAM_CHAT_ID not set, notifications go to the log");
            Arc::new(LogNotifier)
        }
    };

    let narrator = Arc::new(ChatCompletionNarrator::new(NarrativeSettings::from_env())?);
    let profiles = Arc::new(CachedProfileService::new(
        market.clone(),
        config.profile_ttl,
        Arc::new(SystemClock),
    ));

    let mut engine = Engine::new(config, market, store, narrator, notifier)
        .with_profiles(profiles)
        .with_metrics(metrics);

    if options.redis_locks {
        let lock: Arc<dyn RunLock> = Arc::new(RedisRunLock::connect(&config::get_redis_url()).await?);
        engine = engine.with_lock(lock);
    }

    Ok(engine)
}
