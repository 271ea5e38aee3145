use std::time::Duration;
use tracing::warn;

use crate::cache::CacheTiers;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Runtime settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_address: String,
    /// PostgreSQL store when set, in-memory store otherwise
    pub database_url: Option<String>,
    pub cache_tiers: CacheTiers,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let cache_tiers = match var("ANALYTICS_CACHE_TTL_SECS") {
            None => CacheTiers::default(),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => CacheTiers::uniform(Duration::from_secs(secs)),
                Err(_) => {
                    warn!(value = %raw, "Ignoring invalid ANALYTICS_CACHE_TTL_SECS");
                    CacheTiers::default()
                }
            },
        };

        Self {
            bind_address: var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database_url: var("DATABASE_URL"),
            cache_tiers,
        }
    }
}
