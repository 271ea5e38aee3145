use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::types::{
    CareerAverageRow, ConsistencyMetric, ConsistencyRow, GoalsPer90Row, HeadToHead,
    InjuryBurdenRow, NationalityWinRate, PlayerLoadRow, PlayerVsTeam, PlayerWinRate,
    PresenceBucket, StandingRow, TopScorerRow, TrendBucket, TrendPoint,
};
use super::{availability, matchups, rates, standings, trends};
use crate::ledger::{LedgerRepository, LedgerSnapshot};
use crate::shared::AppError;

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", name)))
}

/// Read side of the ledger
///
/// Every call takes a fresh snapshot and recomputes from it; nothing is
/// stored between calls.
pub struct AnalyticsService {
    repository: Arc<dyn LedgerRepository>,
}

impl AnalyticsService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot, AppError> {
        let snapshot = self.repository.snapshot().await?;
        debug!(
            matches = snapshot.matches.len(),
            stat_lines = snapshot.player_stats.len(),
            scores = snapshot.scores.len(),
            "Ledger snapshot loaded"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    pub async fn standings(&self) -> Result<Vec<StandingRow>, AppError> {
        Ok(standings::standings(&self.snapshot().await?))
    }

    #[instrument(skip(self))]
    pub async fn goals_per_90(&self) -> Result<Vec<GoalsPer90Row>, AppError> {
        Ok(rates::goals_per_90(&self.snapshot().await?))
    }

    #[instrument(skip(self))]
    pub async fn career_averages(
        &self,
        player_id: Option<&str>,
    ) -> Result<Vec<CareerAverageRow>, AppError> {
        Ok(rates::career_averages(&self.snapshot().await?, player_id))
    }

    #[instrument(skip(self))]
    pub async fn consistency(
        &self,
        player_id: Option<&str>,
        metric: ConsistencyMetric,
    ) -> Result<Vec<ConsistencyRow>, AppError> {
        Ok(rates::consistency(&self.snapshot().await?, player_id, metric))
    }

    /// Both team ids are required and must differ
    #[instrument(skip(self))]
    pub async fn head_to_head(
        &self,
        team_a: Option<&str>,
        team_b: Option<&str>,
    ) -> Result<HeadToHead, AppError> {
        let team_a = required(team_a, "teamA")?;
        let team_b = required(team_b, "teamB")?;
        if team_a == team_b {
            return Err(AppError::BadRequest(
                "teamA and teamB must be different teams".to_string(),
            ));
        }
        Ok(matchups::head_to_head(&self.snapshot().await?, team_a, team_b))
    }

    /// `Ok(None)` when the player or the opponent does not exist
    #[instrument(skip(self))]
    pub async fn player_vs_team(
        &self,
        player_id: Option<&str>,
        opponent_team_id: Option<&str>,
    ) -> Result<Option<PlayerVsTeam>, AppError> {
        let player_id = required(player_id, "playerId")?;
        let opponent_team_id = required(opponent_team_id, "teamId")?;
        Ok(matchups::player_vs_team(
            &self.snapshot().await?,
            player_id,
            opponent_team_id,
        ))
    }

    #[instrument(skip(self))]
    pub async fn presence_impact(
        &self,
        player_id: Option<&str>,
        opponent_team_id: Option<&str>,
    ) -> Result<Vec<PresenceBucket>, AppError> {
        let player_id = required(player_id, "playerId")?;
        let opponent_team_id = required(opponent_team_id, "opponentTeamId")?;
        Ok(matchups::presence_impact(
            &self.snapshot().await?,
            player_id,
            opponent_team_id,
        ))
    }

    #[instrument(skip(self))]
    pub async fn player_win_rate(&self) -> Result<Vec<PlayerWinRate>, AppError> {
        Ok(trends::player_win_rate(&self.snapshot().await?))
    }

    #[instrument(skip(self))]
    pub async fn win_rate_by_nationality(&self) -> Result<Vec<NationalityWinRate>, AppError> {
        Ok(trends::win_rate_by_nationality(&self.snapshot().await?))
    }

    #[instrument(skip(self))]
    pub async fn seasonal_trend(&self, bucket: TrendBucket) -> Result<Vec<TrendPoint>, AppError> {
        Ok(trends::seasonal_trend(&self.snapshot().await?, bucket))
    }

    /// A missing tournament id yields no rows; a zero limit falls back to the default
    #[instrument(skip(self))]
    pub async fn top_scorers_by_tournament(
        &self,
        tournament_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<TopScorerRow>, AppError> {
        let Some(tournament_id) = tournament_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(Vec::new());
        };
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(trends::DEFAULT_TOP_SCORERS_LIMIT);
        Ok(trends::top_scorers_by_tournament(
            &self.snapshot().await?,
            tournament_id,
            limit,
        ))
    }

    #[instrument(skip(self))]
    pub async fn injury_burden(&self, today: NaiveDate) -> Result<Vec<InjuryBurdenRow>, AppError> {
        Ok(availability::injury_burden(&self.snapshot().await?, today))
    }

    #[instrument(skip(self))]
    pub async fn player_load_vs_active_injuries(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<PlayerLoadRow>, AppError> {
        Ok(availability::player_load_vs_active_injuries(
            &self.snapshot().await?,
            today,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedgerRepository;

    fn service() -> AnalyticsService {
        AnalyticsService::new(Arc::new(InMemoryLedgerRepository::new()))
    }

    #[tokio::test]
    async fn test_empty_ledger_reads_are_empty() {
        let service = service();
        assert!(service.standings().await.unwrap().is_empty());
        assert!(service.goals_per_90().await.unwrap().is_empty());
        assert!(service
            .consistency(None, ConsistencyMetric::default())
            .await
            .unwrap()
            .is_empty());
        assert!(service
            .seasonal_trend(TrendBucket::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_head_to_head_requires_two_distinct_teams() {
        let service = service();
        assert!(matches!(
            service.head_to_head(Some("a"), None).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.head_to_head(Some(" "), Some("b")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.head_to_head(Some("a"), Some("a")).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_player_vs_team_unknown_is_none() {
        let result = service()
            .player_vs_team(Some("ghost"), Some("nobody"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_top_scorers_without_tournament_is_empty() {
        let rows = service().top_scorers_by_tournament(None, Some(5)).await.unwrap();
        assert!(rows.is_empty());
    }
}
