//! Snapshot builder for engine tests, with caller-chosen ids

use chrono::{DateTime, NaiveDate, Utc};

use crate::ledger::{
    InjurySeverity, LedgerSnapshot, MatchModel, MatchStatus, PlayerInjuryModel,
    PlayerMatchStatsModel, PlayerModel, ScoreModel, TeamModel, TournamentModel,
};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn kickoff(s: &str) -> DateTime<Utc> {
    date(s).and_hms_opt(15, 0, 0).unwrap().and_utc()
}

#[derive(Default)]
pub struct SnapshotBuilder {
    snapshot: LedgerSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn team(mut self, id: &str, name: &str) -> Self {
        let mut team = TeamModel::new(name);
        team.id = id.to_string();
        self.snapshot.teams.push(team);
        self
    }

    pub fn player(mut self, id: &str, name: &str, team_id: Option<&str>) -> Self {
        let (first, last) = name.split_once(' ').unwrap_or((name, ""));
        let mut player = PlayerModel::new(
            first,
            last,
            self.snapshot.players.len() as i32 + 1,
            team_id.map(str::to_string),
        );
        player.id = id.to_string();
        self.snapshot.players.push(player);
        self
    }

    pub fn nationality(mut self, player_id: &str, nationality: &str) -> Self {
        if let Some(p) = self.snapshot.players.iter_mut().find(|p| p.id == player_id) {
            p.nationality = Some(nationality.to_string());
        }
        self
    }

    pub fn tournament(mut self, id: &str, name: &str) -> Self {
        let mut tournament = TournamentModel::new(name, date("2024-01-01"), None);
        tournament.id = id.to_string();
        self.snapshot.tournaments.push(tournament);
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn completed(
        mut self,
        id: &str,
        tournament_id: &str,
        home: &str,
        away: &str,
        day: &str,
        home_score: i32,
        away_score: i32,
    ) -> Self {
        let mut fixture = MatchModel::new(tournament_id, home, away, kickoff(day));
        fixture.id = id.to_string();
        fixture.status = MatchStatus::Completed;
        fixture.home_score = home_score;
        fixture.away_score = away_score;
        self.snapshot.matches.push(fixture);
        self
    }

    pub fn upcoming(mut self, id: &str, tournament_id: &str, home: &str, away: &str, day: &str) -> Self {
        let mut fixture = MatchModel::new(tournament_id, home, away, kickoff(day));
        fixture.id = id.to_string();
        self.snapshot.matches.push(fixture);
        self
    }

    pub fn stats(mut self, player_id: &str, match_id: &str, minutes: i32, goals: i32, assists: i32) -> Self {
        self.snapshot.player_stats.push(PlayerMatchStatsModel {
            player_id: player_id.to_string(),
            match_id: match_id.to_string(),
            minutes_played: minutes,
            goals,
            assists,
            ..Default::default()
        });
        self
    }

    pub fn shots(mut self, player_id: &str, match_id: &str, shots_on_target: i32) -> Self {
        if let Some(line) = self
            .snapshot
            .player_stats
            .iter_mut()
            .find(|s| s.player_id == player_id && s.match_id == match_id)
        {
            line.shots_on_target = shots_on_target;
        }
        self
    }

    pub fn score(mut self, match_id: &str, player_id: &str, minute: i32, result: Option<f64>) -> Self {
        self.snapshot
            .scores
            .push(ScoreModel::new(match_id, player_id, minute, None, result));
        self
    }

    pub fn injury(mut self, player_id: &str, start: &str, end: Option<&str>) -> Self {
        self.snapshot.injuries.push(PlayerInjuryModel::new(
            player_id,
            date(start),
            end.map(date),
            InjurySeverity::Medium,
        ));
        self
    }

    pub fn build(self) -> LedgerSnapshot {
        self.snapshot
    }
}
