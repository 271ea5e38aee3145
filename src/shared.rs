use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{AnalyticsCache, CacheTiers};
use crate::ledger::LedgerRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub ledger_repository: Arc<dyn LedgerRepository>,
    pub cache: Arc<dyn AnalyticsCache>,
    pub cache_tiers: CacheTiers,
}

impl AppState {
    pub fn new(
        ledger_repository: Arc<dyn LedgerRepository>,
        cache: Arc<dyn AnalyticsCache>,
        cache_tiers: CacheTiers,
    ) -> Self {
        Self {
            ledger_repository,
            cache,
            cache_tiers,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Stable machine-readable kind, rendered alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::DatabaseError(_) => "database_error",
            AppError::Internal => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "kind": kind,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::cache::InMemoryAnalyticsCache;
    use crate::ledger::InMemoryLedgerRepository;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        ledger_repository: Option<Arc<dyn LedgerRepository>>,
        cache: Option<Arc<dyn AnalyticsCache>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                ledger_repository: None,
                cache: None,
            }
        }

        pub fn with_ledger_repository(mut self, repo: Arc<dyn LedgerRepository>) -> Self {
            self.ledger_repository = Some(repo);
            self
        }

        pub fn with_cache(mut self, cache: Arc<dyn AnalyticsCache>) -> Self {
            self.cache = Some(cache);
            self
        }

        pub fn build(self) -> AppState {
            AppState {
                ledger_repository: self
                    .ledger_repository
                    .unwrap_or_else(|| Arc::new(InMemoryLedgerRepository::new())),
                cache: self
                    .cache
                    .unwrap_or_else(|| Arc::new(InMemoryAnalyticsCache::new())),
                cache_tiers: CacheTiers::default(),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
