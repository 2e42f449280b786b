//! Unit tests for the TTL-cached profile service

use async_trait::async_trait;
use candlescope::cache::ManualClock;
use candlescope::models::CompanyProfile;
use candlescope::services::{CachedProfileService, ProfileProvider};
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct CountingProvider {
    calls: AtomicUsize,
    down: AtomicBool,
}

#[async_trait]
impl ProfileProvider for CountingProvider {
    async fn get_profile(
        &self,
        symbol: &str,
    ) -> Result<CompanyProfile, Box<dyn std::error::Error + Send + Sync>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err("profile endpoint down".into());
        }
        Ok(CompanyProfile {
            symbol: symbol.to_string(),
            sector: Some("Financial Services".to_string()),
            industry: Some("Banks - Regional".to_string()),
        })
    }
}

fn setup() -> (Arc<CountingProvider>, Arc<ManualClock>, CachedProfileService) {
    let provider = Arc::new(CountingProvider::default());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 2, 2, 0, 0).unwrap()));
    let service = CachedProfileService::new(provider.clone(), Duration::from_secs(3600), clock.clone());
    (provider, clock, service)
}

#[tokio::test]
async fn test_fresh_profile_is_served_from_cache() {
    let (provider, _clock, service) = setup();

    assert_eq!(service.sector("BBCA.JK").await.as_deref(), Some("Financial Services"));
    assert_eq!(service.sector("BBCA.JK").await.as_deref(), Some("Financial Services"));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stale_profile_is_refreshed() {
    let (provider, clock, service) = setup();

    service.profile("BBCA.JK").await;
    clock.advance(Duration::from_secs(3601));
    service.profile("BBCA.JK").await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stale_profile_survives_provider_outage() {
    let (provider, clock, service) = setup();

    service.profile("BBCA.JK").await;
    clock.advance(Duration::from_secs(7200));
    provider.down.store(true, Ordering::SeqCst);

    let profile = service.profile("BBCA.JK").await.unwrap();
    assert_eq!(profile.industry.as_deref(), Some("Banks - Regional"));
}

#[tokio::test]
async fn test_unknown_symbol_during_outage_is_none() {
    let (provider, _clock, service) = setup();
    provider.down.store(true, Ordering::SeqCst);
    assert!(service.profile("TLKM.JK").await.is_none());
}
