//! Company profile lookups behind a TTL cache

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{Clock, TtlCache};
use crate::models::quote::CompanyProfile;

#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn get_profile(
        &self,
        symbol: &str,
    ) -> Result<CompanyProfile, Box<dyn std::error::Error + Send + Sync>>;
}

/// Profile lookups served from cache while fresh.
///
/// When a refresh fails the stale entry is returned instead; a lookup never
/// fails outright, it just yields `None`.
pub struct CachedProfileService {
    provider: Arc<dyn ProfileProvider>,
    cache: TtlCache<String, CompanyProfile>,
}

impl CachedProfileService {
    pub fn new(provider: Arc<dyn ProfileProvider>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            cache: TtlCache::new(ttl, clock),
        }
    }

    pub async fn profile(&self, symbol: &str) -> Option<CompanyProfile> {
        let key = symbol.to_string();
        let cached = self.cache.get(&key).await;

        if let Some(hit) = &cached {
            if hit.is_fresh {
                return Some(hit.value.clone());
            }
        }

        match self.provider.get_profile(symbol).await {
            Ok(profile) => {
                debug!(symbol = %symbol, sector = ?profile.sector, "Profile refreshed for {}", symbol);
                self.cache.put_now(key, profile.clone()).await;
                Some(profile)
            }
            Err(e) => {
                warn!(
                    symbol = %symbol,
                    error = %e,
                    stale_available = cached.is_some(),
                    "Profile lookup failed for {}",
                    symbol
                );
                cached.map(|c| c.value)
            }
        }
    }

    pub async fn sector(&self, symbol: &str) -> Option<String> {
        self.profile(symbol).await.and_then(|p| p.sector)
    }
}
