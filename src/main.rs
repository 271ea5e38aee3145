use matchday::{
    api, AppConfig, AppState, InMemoryAnalyticsCache, InMemoryLedgerRepository, LedgerRepository,
};
use matchday::ledger::PostgresLedgerRepository;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchday=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    info!(bind_address = %config.bind_address, "Starting matchday server");

    let ledger_repository: Arc<dyn LedgerRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Using PostgreSQL ledger");
            Arc::new(PostgresLedgerRepository::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory ledger");
            Arc::new(InMemoryLedgerRepository::new())
        }
    };

    let app_state = AppState::new(
        ledger_repository,
        Arc::new(InMemoryAnalyticsCache::new()),
        config.cache_tiers,
    );
    let app = api::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server running on http://{}", config.bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}
