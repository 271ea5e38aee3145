use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    service::MatchCompletionService,
    types::{ActorContext, CompleteMatchRequest},
};
use crate::cache::ANALYTICS_KEY_PATTERN;
use crate::extract::ApiJson;
use crate::ledger::MatchModel;
use crate::shared::{AppError, AppState};

pub const ACTOR_HEADER: &str = "x-actor-id";

fn actor_from_headers(headers: &HeaderMap) -> ActorContext {
    ActorContext {
        user_id: headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    }
}

/// HTTP handler for completing a match
///
/// POST /matches/:match_id/complete
/// Returns the completed match with its final score
#[instrument(name = "complete_match", skip(state, headers, request))]
pub async fn complete_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CompleteMatchRequest>,
) -> Result<Json<MatchModel>, AppError> {
    let actor = actor_from_headers(&headers);

    let service = MatchCompletionService::new(Arc::clone(&state.ledger_repository));
    let completed = service.complete_match(&match_id, request, &actor).await?;

    let evicted = state.cache.invalidate(ANALYTICS_KEY_PATTERN).await;
    debug!(evicted, "Analytics cache invalidated");

    info!(
        match_id = %completed.id,
        home_score = completed.home_score,
        away_score = completed.away_score,
        "Match completion accepted"
    );

    Ok(Json(completed))
}
