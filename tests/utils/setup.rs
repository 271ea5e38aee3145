use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

use matchday::{
    completion::{PlayerStatLine, ScoringEvent},
    ledger::{MatchModel, PlayerModel, TeamModel, TournamentModel},
    ActorContext, AnalyticsService, AppState, CacheTiers, CompleteMatchRequest,
    InMemoryAnalyticsCache, InMemoryLedgerRepository, LedgerRepository, LedgerSnapshot,
    MatchCompletionService,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn kickoff(s: &str) -> DateTime<Utc> {
    day(s).and_hms_opt(19, 30, 0).unwrap().and_utc()
}

/// In-memory ledger seeded through the repository, one tournament per setup
pub struct LedgerSetup {
    pub repo: Arc<InMemoryLedgerRepository>,
    pub cache: Arc<InMemoryAnalyticsCache>,
    pub tournament: TournamentModel,
    next_jersey: i32,
}

impl LedgerSetup {
    pub async fn new() -> Self {
        let repo = Arc::new(InMemoryLedgerRepository::new());
        let tournament = TournamentModel::new("Premier Cup", day("2024-08-01"), None);
        repo.insert_tournament(&tournament).await.unwrap();

        Self {
            repo,
            cache: Arc::new(InMemoryAnalyticsCache::new()),
            tournament,
            next_jersey: 1,
        }
    }

    pub async fn team(&self, name: &str) -> TeamModel {
        let team = TeamModel::new(name);
        self.repo.insert_team(&team).await.unwrap();
        team
    }

    pub async fn player(&mut self, name: &str, team: Option<&TeamModel>) -> PlayerModel {
        let (first, last) = name.split_once(' ').unwrap_or((name, ""));
        let player = PlayerModel::new(first, last, self.next_jersey, team.map(|t| t.id.clone()));
        self.next_jersey += 1;
        self.repo.insert_player(&player).await.unwrap();
        player
    }

    pub async fn fixture(&self, home: &TeamModel, away: &TeamModel, date: &str) -> MatchModel {
        let fixture = MatchModel::new(&self.tournament.id, &home.id, &away.id, kickoff(date));
        self.repo.insert_match(&fixture).await.unwrap();
        fixture
    }

    pub fn completion_service(&self) -> MatchCompletionService {
        MatchCompletionService::new(self.repo.clone())
    }

    pub fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(self.repo.clone())
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.repo.clone(), self.cache.clone(), CacheTiers::default())
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.repo.snapshot().await.unwrap()
    }

    /// Completes a fixture and panics on failure
    pub async fn complete(
        &self,
        fixture: &MatchModel,
        home_score: i32,
        away_score: i32,
        player_stats: Vec<PlayerStatLine>,
        scoring_events: Vec<ScoringEvent>,
    ) -> MatchModel {
        self.completion_service()
            .complete_match(
                &fixture.id,
                CompleteMatchRequest {
                    home_score,
                    away_score,
                    player_stats,
                    scoring_events,
                },
                &ActorContext::default(),
            )
            .await
            .unwrap()
    }
}

// ============================================================================
// Payload Helpers
// ============================================================================

pub fn line(player: &PlayerModel, minutes: i32, goals: i32, assists: i32) -> PlayerStatLine {
    PlayerStatLine {
        player_id: player.id.clone(),
        minutes_played: minutes,
        goals,
        assists,
        ..Default::default()
    }
}

pub fn goal(player: &PlayerModel, minute: i32) -> ScoringEvent {
    ScoringEvent {
        player_id: player.id.clone(),
        minute_scored: Some(minute),
        goal_type: None,
    }
}
