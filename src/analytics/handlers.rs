use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

use super::{
    service::AnalyticsService,
    types::{
        CareerAverageRow, ConsistencyMetric, ConsistencyRow, GoalsPer90Row, HeadToHead,
        InjuryBurdenRow, NationalityWinRate, PlayerLoadRow, PlayerVsTeam, PlayerWinRate,
        PresenceBucket, StandingRow, TopScorerRow, TrendBucket, TrendPoint,
    },
};
use crate::cache::{cache_key, cached};
use crate::extract::ApiQuery;
use crate::shared::{AppError, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerFilterQuery {
    pub player_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyQuery {
    pub player_id: Option<String>,
    pub metric: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHeadQuery {
    pub team_a: Option<String>,
    pub team_b: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerVsTeamQuery {
    pub player_id: Option<String>,
    pub team_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceImpactQuery {
    pub player_id: Option<String>,
    pub opponent_team_id: Option<String>,
    /// Older clients send the opponent as `teamId`
    pub team_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonalTrendQuery {
    pub bucket: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopScorersQuery {
    pub tournament_id: Option<String>,
    pub limit: Option<usize>,
}

fn parse_choice<T: FromStr + Default>(raw: Option<&str>, name: &str) -> Result<T, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(T::default()),
        Some(value) => T::from_str(&value.to_ascii_lowercase())
            .map_err(|_| AppError::BadRequest(format!("Unsupported {}: {}", name, value))),
    }
}

fn service(state: &AppState) -> AnalyticsService {
    AnalyticsService::new(Arc::clone(&state.ledger_repository))
}

/// GET /analytics/standings
#[instrument(name = "standings", skip(state))]
pub async fn standings(State(state): State<AppState>) -> Result<Json<Vec<StandingRow>>, AppError> {
    let service = service(&state);
    let key = cache_key("analytics:standings", &[]);
    let rows = cached(state.cache.as_ref(), &key, state.cache_tiers.medium, || {
        service.standings()
    })
    .await?;
    Ok(Json(rows))
}

/// GET /analytics/goals-per-90
#[instrument(name = "goals_per_90", skip(state))]
pub async fn goals_per_90(
    State(state): State<AppState>,
) -> Result<Json<Vec<GoalsPer90Row>>, AppError> {
    let service = service(&state);
    let key = cache_key("analytics:goalsPer90", &[]);
    let rows = cached(state.cache.as_ref(), &key, state.cache_tiers.low, || {
        service.goals_per_90()
    })
    .await?;
    Ok(Json(rows))
}

/// GET /analytics/career-averages?playerId=
#[instrument(name = "career_averages", skip(state))]
pub async fn career_averages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PlayerFilterQuery>,
) -> Result<Json<Vec<CareerAverageRow>>, AppError> {
    let service = service(&state);
    let key = cache_key(
        "analytics:careerAverages",
        &[("playerId", query.player_id.clone())],
    );
    let rows = cached(state.cache.as_ref(), &key, state.cache_tiers.low, || {
        service.career_averages(query.player_id.as_deref())
    })
    .await?;
    Ok(Json(rows))
}

/// GET /analytics/consistency?playerId=&metric=result|goals|assists
#[instrument(name = "consistency", skip(state))]
pub async fn consistency(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ConsistencyQuery>,
) -> Result<Json<Vec<ConsistencyRow>>, AppError> {
    let metric: ConsistencyMetric = parse_choice(query.metric.as_deref(), "metric")?;
    let service = service(&state);
    let key = cache_key(
        "analytics:consistency",
        &[
            ("playerId", query.player_id.clone()),
            ("metric", Some(metric.to_string())),
        ],
    );
    let rows = cached(state.cache.as_ref(), &key, state.cache_tiers.low, || {
        service.consistency(query.player_id.as_deref(), metric)
    })
    .await?;
    Ok(Json(rows))
}

/// GET /analytics/head-to-head?teamA=&teamB=
#[instrument(name = "head_to_head", skip(state))]
pub async fn head_to_head(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HeadToHeadQuery>,
) -> Result<Json<HeadToHead>, AppError> {
    let service = service(&state);
    let key = cache_key(
        "analytics:headToHead",
        &[("teamA", query.team_a.clone()), ("teamB", query.team_b.clone())],
    );
    let summary = cached(state.cache.as_ref(), &key, state.cache_tiers.medium, || {
        service.head_to_head(query.team_a.as_deref(), query.team_b.as_deref())
    })
    .await?;
    Ok(Json(summary))
}

/// GET /analytics/player-vs-team?playerId=&teamId=
#[instrument(name = "player_vs_team", skip(state))]
pub async fn player_vs_team(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PlayerVsTeamQuery>,
) -> Result<Json<PlayerVsTeam>, AppError> {
    let service = service(&state);
    let key = cache_key(
        "analytics:playerVsTeam",
        &[("playerId", query.player_id.clone()), ("teamId", query.team_id.clone())],
    );
    let row = cached(state.cache.as_ref(), &key, state.cache_tiers.medium, || {
        service.player_vs_team(query.player_id.as_deref(), query.team_id.as_deref())
    })
    .await?;

    row.map(Json)
        .ok_or_else(|| AppError::NotFound("Player or team not found".to_string()))
}

/// GET /analytics/player-presence-impact?playerId=&opponentTeamId=
#[instrument(name = "presence_impact", skip(state))]
pub async fn presence_impact(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PresenceImpactQuery>,
) -> Result<Json<Vec<PresenceBucket>>, AppError> {
    let opponent = query.opponent_team_id.or(query.team_id);
    let service = service(&state);
    let key = cache_key(
        "analytics:presenceImpact",
        &[
            ("playerId", query.player_id.clone()),
            ("opponentTeamId", opponent.clone()),
        ],
    );
    let buckets = cached(state.cache.as_ref(), &key, state.cache_tiers.medium, || {
        service.presence_impact(query.player_id.as_deref(), opponent.as_deref())
    })
    .await?;
    Ok(Json(buckets))
}

/// GET /analytics/player-win-rate
#[instrument(name = "player_win_rate", skip(state))]
pub async fn player_win_rate(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlayerWinRate>>, AppError> {
    let service = service(&state);
    let key = cache_key("analytics:playerWinRate", &[]);
    let rows = cached(state.cache.as_ref(), &key, state.cache_tiers.low, || {
        service.player_win_rate()
    })
    .await?;
    Ok(Json(rows))
}

/// GET /analytics/player-win-rate-by-nationality
#[instrument(name = "win_rate_by_nationality", skip(state))]
pub async fn win_rate_by_nationality(
    State(state): State<AppState>,
) -> Result<Json<Vec<NationalityWinRate>>, AppError> {
    let service = service(&state);
    let key = cache_key("analytics:winRateByNationality", &[]);
    let rows = cached(state.cache.as_ref(), &key, state.cache_tiers.low, || {
        service.win_rate_by_nationality()
    })
    .await?;
    Ok(Json(rows))
}

/// GET /analytics/seasonal-trend?bucket=day|week|month
#[instrument(name = "seasonal_trend", skip(state))]
pub async fn seasonal_trend(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SeasonalTrendQuery>,
) -> Result<Json<Vec<TrendPoint>>, AppError> {
    let bucket: TrendBucket = parse_choice(query.bucket.as_deref(), "bucket")?;
    let service = service(&state);
    let key = cache_key(
        "analytics:seasonalTrend",
        &[("bucket", Some(bucket.to_string()))],
    );
    let points = cached(state.cache.as_ref(), &key, state.cache_tiers.low, || {
        service.seasonal_trend(bucket)
    })
    .await?;
    Ok(Json(points))
}

/// GET /analytics/top-scorers?tournamentId=&limit=
#[instrument(name = "top_scorers", skip(state))]
pub async fn top_scorers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TopScorersQuery>,
) -> Result<Json<Vec<TopScorerRow>>, AppError> {
    let service = service(&state);
    let key = cache_key(
        "analytics:topScorers",
        &[
            ("tournamentId", query.tournament_id.clone()),
            ("limit", query.limit.map(|l| l.to_string())),
        ],
    );
    let rows = cached(state.cache.as_ref(), &key, state.cache_tiers.medium, || {
        service.top_scorers_by_tournament(query.tournament_id.as_deref(), query.limit)
    })
    .await?;
    Ok(Json(rows))
}

/// GET /analytics/injury-burden
#[instrument(name = "injury_burden", skip(state))]
pub async fn injury_burden(
    State(state): State<AppState>,
) -> Result<Json<Vec<InjuryBurdenRow>>, AppError> {
    let today = Utc::now().date_naive();
    let service = service(&state);
    let key = cache_key(
        "analytics:injuryBurden",
        &[("today", Some(today.to_string()))],
    );
    let rows = cached(state.cache.as_ref(), &key, state.cache_tiers.low, || {
        service.injury_burden(today)
    })
    .await?;
    Ok(Json(rows))
}

/// GET /analytics/player-load-vs-active-injuries
#[instrument(name = "player_load_vs_active_injuries", skip(state))]
pub async fn player_load_vs_active_injuries(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlayerLoadRow>>, AppError> {
    let today = Utc::now().date_naive();
    let service = service(&state);
    let key = cache_key(
        "analytics:playerLoadVsActiveInjuries",
        &[("today", Some(today.to_string()))],
    );
    let rows = cached(state.cache.as_ref(), &key, state.cache_tiers.low, || {
        service.player_load_vs_active_injuries(today)
    })
    .await?;
    Ok(Json(rows))
}
