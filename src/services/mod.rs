//! External collaborators: market data, company profiles, narratives, notifications.

pub mod market_data;
pub mod narrative;
pub mod notifier;
pub mod profile;
pub mod yahoo;

pub use market_data::MarketDataProvider;
pub use narrative::{ChatCompletionNarrator, NarrativeGenerator};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use profile::{CachedProfileService, ProfileProvider};
pub use yahoo::YahooMarketDataProvider;
