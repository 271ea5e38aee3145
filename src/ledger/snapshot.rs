use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::models::{
    MatchModel, PlayerInjuryModel, PlayerMatchStatsModel, PlayerModel, ScoreModel, TeamModel,
    TournamentModel,
};

/// Point-in-time copy of the ledger that the read engines aggregate over.
///
/// Repositories return rows ordered by id so that engines using stable sorts
/// produce the same output for the same ledger state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub teams: Vec<TeamModel>,
    pub players: Vec<PlayerModel>,
    pub tournaments: Vec<TournamentModel>,
    pub matches: Vec<MatchModel>,
    pub player_stats: Vec<PlayerMatchStatsModel>,
    pub scores: Vec<ScoreModel>,
    pub injuries: Vec<PlayerInjuryModel>,
}

impl LedgerSnapshot {
    pub fn team(&self, team_id: &str) -> Option<&TeamModel> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerModel> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn tournament(&self, tournament_id: &str) -> Option<&TournamentModel> {
        self.tournaments.iter().find(|t| t.id == tournament_id)
    }

    pub fn completed_matches(&self) -> impl Iterator<Item = &MatchModel> {
        self.matches.iter().filter(|m| m.is_completed())
    }

    pub fn teams_by_id(&self) -> HashMap<&str, &TeamModel> {
        self.teams.iter().map(|t| (t.id.as_str(), t)).collect()
    }

    pub fn players_by_id(&self) -> HashMap<&str, &PlayerModel> {
        self.players.iter().map(|p| (p.id.as_str(), p)).collect()
    }

    pub fn matches_by_id(&self) -> HashMap<&str, &MatchModel> {
        self.matches.iter().map(|m| (m.id.as_str(), m)).collect()
    }
}
