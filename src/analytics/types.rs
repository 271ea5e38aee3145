use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub team_id: String,
    pub team_name: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsPer90Row {
    pub player_id: String,
    pub name: String,
    pub team_id: Option<String>,
    pub goals: i64,
    pub minutes: i64,
    pub goals_per_90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerAverageRow {
    pub player_id: String,
    pub name: String,
    pub team_id: Option<String>,
    pub matches: u32,
    pub total_goals: i64,
    pub total_assists: i64,
    pub total_minutes: i64,
    pub total_shots_on_target: i64,
    pub avg_goals: f64,
    pub avg_assists: f64,
    pub avg_minutes: f64,
    pub avg_shots_on_target: f64,
    pub goals_per_90: f64,
}

/// Per-match series a consistency row is computed over
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConsistencyMetric {
    /// Result indicator of each goal the player scored
    #[default]
    Result,
    Goals,
    Assists,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyRow {
    pub player_id: String,
    pub name: String,
    pub metric: ConsistencyMetric,
    pub samples: u32,
    pub average: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWins {
    pub id: String,
    pub wins: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHeadSummary {
    pub team_a: TeamWins,
    pub team_b: TeamWins,
    pub draws: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHeadDetail {
    pub match_id: String,
    pub home_team: String,
    pub away_team: String,
    pub score: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHead {
    pub summary: HeadToHeadSummary,
    pub details: Vec<HeadToHeadDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerVsTeam {
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub opponent_team_id: String,
    pub opponent_team_name: String,
    pub total_goals: i64,
    pub total_assists: i64,
    pub total_minutes: i64,
    pub appearances: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceBucket {
    pub is_present: bool,
    /// Average goals of the player's team in the bucket's matches
    pub avg_goals: f64,
    pub samples: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWinRate {
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub avg_result: f64,
    pub samples: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalityWinRate {
    pub nationality: Option<String>,
    pub avg_result: f64,
    pub samples: u32,
}

/// Calendar granularity for the seasonal trend
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrendBucket {
    Day,
    Week,
    #[default]
    Month,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub bucket_label: String,
    pub avg_result: f64,
    pub samples: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopScorerRow {
    pub rank: u32,
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub team_id: Option<String>,
    pub total_goals: i64,
    pub total_assists: i64,
    pub appearances: u32,
    pub total_minutes: i64,
    pub total_points: i64,
    pub tournament_id: String,
    pub tournament_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjuryBurdenRow {
    pub team_id: String,
    pub team_name: String,
    pub active_injuries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLoadRow {
    pub player_id: String,
    pub first_name: String,
    pub last_name: String,
    pub minutes: i64,
    pub active_injuries: u32,
}
