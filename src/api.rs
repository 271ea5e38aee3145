use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::analytics::handlers as analytics;
use crate::completion;
use crate::shared::AppState;

/// All HTTP routes with request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/matches/:match_id/complete",
            post(completion::complete_match),
        )
        .nest("/analytics", analytics_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/standings", get(analytics::standings))
        .route("/goals-per-90", get(analytics::goals_per_90))
        .route("/career-averages", get(analytics::career_averages))
        .route("/consistency", get(analytics::consistency))
        .route("/head-to-head", get(analytics::head_to_head))
        .route("/player-vs-team", get(analytics::player_vs_team))
        .route("/player-presence-impact", get(analytics::presence_impact))
        .route("/player-win-rate", get(analytics::player_win_rate))
        .route(
            "/player-win-rate-by-nationality",
            get(analytics::win_rate_by_nationality),
        )
        .route("/seasonal-trend", get(analytics::seasonal_trend))
        .route("/top-scorers", get(analytics::top_scorers))
        .route("/injury-burden", get(analytics::injury_burden))
        .route(
            "/player-load-vs-active-injuries",
            get(analytics::player_load_vs_active_injuries),
        )
}
