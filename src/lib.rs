// Library crate for the matchday ledger and analytics server
// This file exposes the public API for integration tests

pub mod analytics;
pub mod api;
pub mod cache;
pub mod completion;
pub mod config;
pub mod extract;
pub mod ledger;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use analytics::AnalyticsService;
pub use cache::{AnalyticsCache, CacheTiers, InMemoryAnalyticsCache};
pub use completion::{ActorContext, CompleteMatchRequest, MatchCompletionService};
pub use config::AppConfig;
pub use ledger::{InMemoryLedgerRepository, LedgerRepository, LedgerSnapshot};
pub use shared::{AppError, AppState};
