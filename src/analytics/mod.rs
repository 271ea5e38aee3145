//! Read engines over a ledger snapshot and their HTTP surface
//!
//! Each engine is a pure function of `LedgerSnapshot`. `AnalyticsService`
//! loads the snapshot and checks request parameters; the handlers wrap the
//! service in the analytics cache.

// Public API - what other modules can use
pub use service::AnalyticsService;
pub use types::*;

// Engines
pub mod availability;
pub mod matchups;
pub mod rates;
pub mod standings;
pub mod trends;

pub mod handlers;

// Internal modules
mod math;
mod service;
mod types;

#[cfg(test)]
pub(crate) mod fixtures;
