use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Lifecycle of a fixture. Only the move into `Completed` matters to the ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Completed,
    Postponed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InjurySeverity {
    Low,
    Medium,
    High,
}

/// Final-whistle outcome from one team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn from_goals(goals_for: i32, goals_against: i32) -> Self {
        if goals_for > goals_against {
            MatchOutcome::Win
        } else if goals_for < goals_against {
            MatchOutcome::Loss
        } else {
            MatchOutcome::Draw
        }
    }

    /// League points: 3 for a win, 1 for a draw, 0 for a loss
    pub fn points(self) -> u32 {
        match self {
            MatchOutcome::Win => 3,
            MatchOutcome::Draw => 1,
            MatchOutcome::Loss => 0,
        }
    }

    /// Value stored on each score row: 1, 0.5 or 0
    pub fn result_indicator(self) -> f64 {
        match self {
            MatchOutcome::Win => 1.0,
            MatchOutcome::Draw => 0.5,
            MatchOutcome::Loss => 0.0,
        }
    }
}

/// Database model for teams table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamModel {
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl TeamModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            city: None,
            country: None,
        }
    }
}

/// Database model for players table. `team_id` is `None` for free agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerModel {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub nationality: Option<String>,
    pub position: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub jersey_number: i32,
    pub team_id: Option<String>,
}

impl PlayerModel {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        jersey_number: i32,
        team_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            nationality: None,
            position: None,
            birthdate: None,
            jersey_number,
            team_id,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Database model for tournaments table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentModel {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl TournamentModel {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            start_date,
            end_date,
        }
    }
}

/// Database model for matches table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchModel {
    pub id: String,
    pub tournament_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub match_date: DateTime<Utc>,
    pub status: MatchStatus,
    pub home_score: i32,
    pub away_score: i32,
    pub stadium: Option<String>,
    pub referee: Option<String>,
    pub season: Option<String>,
}

impl MatchModel {
    /// Creates an upcoming fixture with a 0-0 scoreline
    pub fn new(
        tournament_id: impl Into<String>,
        home_team_id: impl Into<String>,
        away_team_id: impl Into<String>,
        match_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tournament_id: tournament_id.into(),
            home_team_id: home_team_id.into(),
            away_team_id: away_team_id.into(),
            match_date,
            status: MatchStatus::Upcoming,
            home_score: 0,
            away_score: 0,
            stadium: None,
            referee: None,
            season: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Whether the team plays in this fixture, home or away
    pub fn has_team(&self, team_id: &str) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    /// True when the fixture is between exactly these two teams, in either orientation
    pub fn is_between(&self, team_a: &str, team_b: &str) -> bool {
        (self.home_team_id == team_a && self.away_team_id == team_b)
            || (self.home_team_id == team_b && self.away_team_id == team_a)
    }

    /// (goals for, goals against) for a participating team
    pub fn goals_for(&self, team_id: &str) -> Option<(i32, i32)> {
        if self.home_team_id == team_id {
            Some((self.home_score, self.away_score))
        } else if self.away_team_id == team_id {
            Some((self.away_score, self.home_score))
        } else {
            None
        }
    }

    pub fn outcome_for(&self, team_id: &str) -> Option<MatchOutcome> {
        self.goals_for(team_id)
            .map(|(scored, conceded)| MatchOutcome::from_goals(scored, conceded))
    }
}

/// Per-player counters for one match, unique per (player_id, match_id)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchStatsModel {
    pub player_id: String,
    pub match_id: String,
    pub minutes_played: i32,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub shots_on_target: i32,
}

impl PlayerMatchStatsModel {
    pub fn appeared(&self) -> bool {
        self.minutes_played > 0
    }
}

/// One scoring event. `result` is a snapshot taken at completion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreModel {
    pub id: String,
    pub match_id: String,
    pub player_id: String,
    pub minute_scored: i32,
    pub goal_type: Option<String>,
    pub result: Option<f64>,
}

impl ScoreModel {
    pub fn new(
        match_id: impl Into<String>,
        player_id: impl Into<String>,
        minute_scored: i32,
        goal_type: Option<String>,
        result: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            match_id: match_id.into(),
            player_id: player_id.into(),
            minute_scored,
            goal_type,
            result,
        }
    }
}

/// Database model for player_injuries table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInjuryModel {
    pub id: String,
    pub player_id: String,
    pub injury_start: NaiveDate,
    pub injury_end: Option<NaiveDate>,
    pub severity: InjurySeverity,
}

impl PlayerInjuryModel {
    pub fn new(
        player_id: impl Into<String>,
        injury_start: NaiveDate,
        injury_end: Option<NaiveDate>,
        severity: InjurySeverity,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            player_id: player_id.into(),
            injury_start,
            injury_end,
            severity,
        }
    }

    /// Open-ended injuries and injuries ending today or later are active
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.injury_end.map_or(true, |end| end >= today)
    }
}
