use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ledger::PlayerMatchStatsModel;
use crate::shared::AppError;

/// Request payload for completing a match
///
/// Unknown keys are rejected so a mis-keyed body cannot pass as an empty 0-0 result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompleteMatchRequest {
    #[serde(default)]
    pub home_score: i32,
    #[serde(default)]
    pub away_score: i32,
    #[serde(default)]
    pub player_stats: Vec<PlayerStatLine>,
    #[serde(default)]
    pub scoring_events: Vec<ScoringEvent>,
}

/// Final counters for one player. Missing counters default to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlayerStatLine {
    pub player_id: String,
    #[serde(default)]
    pub minutes_played: i32,
    #[serde(default)]
    pub goals: i32,
    #[serde(default)]
    pub assists: i32,
    #[serde(default)]
    pub yellow_cards: i32,
    #[serde(default)]
    pub red_cards: i32,
    #[serde(default)]
    pub shots_on_target: i32,
}

impl PlayerStatLine {
    pub fn to_model(&self, match_id: &str) -> PlayerMatchStatsModel {
        PlayerMatchStatsModel {
            player_id: self.player_id.clone(),
            match_id: match_id.to_string(),
            minutes_played: self.minutes_played,
            goals: self.goals,
            assists: self.assists,
            yellow_cards: self.yellow_cards,
            red_cards: self.red_cards,
            shots_on_target: self.shots_on_target,
        }
    }

    fn counters(&self) -> [(&'static str, i32); 6] {
        [
            ("minutesPlayed", self.minutes_played),
            ("goals", self.goals),
            ("assists", self.assists),
            ("yellowCards", self.yellow_cards),
            ("redCards", self.red_cards),
            ("shotsOnTarget", self.shots_on_target),
        ]
    }
}

/// One goal as submitted by the caller; `minuteScored` is required
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScoringEvent {
    pub player_id: String,
    #[serde(default)]
    pub minute_scored: Option<i32>,
    #[serde(default)]
    pub goal_type: Option<String>,
}

/// Opaque caller identity, recorded in logs only
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedScoringEvent {
    pub player_id: String,
    pub minute_scored: i32,
    pub goal_type: Option<String>,
}

/// A completion payload that passed every check that does not need the ledger
#[derive(Debug, Clone)]
pub struct ValidatedCompletion {
    pub home_score: i32,
    pub away_score: i32,
    pub player_stats: Vec<PlayerStatLine>,
    pub scoring_events: Vec<ValidatedScoringEvent>,
}

impl CompleteMatchRequest {
    pub fn validate(self) -> Result<ValidatedCompletion, AppError> {
        if self.home_score < 0 || self.away_score < 0 {
            return Err(AppError::BadRequest(
                "Scores must be non-negative".to_string(),
            ));
        }

        for line in &self.player_stats {
            if line.player_id.trim().is_empty() {
                return Err(AppError::BadRequest(
                    "playerStats entries require a playerId".to_string(),
                ));
            }
            if let Some((field, _)) = line.counters().into_iter().find(|(_, v)| *v < 0) {
                return Err(AppError::BadRequest(format!(
                    "{} for player {} must be non-negative",
                    field, line.player_id
                )));
            }
        }

        let scoring_events = self
            .scoring_events
            .into_iter()
            .enumerate()
            .map(|(index, event)| {
                if event.player_id.trim().is_empty() {
                    return Err(AppError::BadRequest(format!(
                        "scoringEvents[{}] requires a playerId",
                        index
                    )));
                }
                match event.minute_scored {
                    Some(minute) if minute >= 0 => Ok(ValidatedScoringEvent {
                        player_id: event.player_id,
                        minute_scored: minute,
                        goal_type: event.goal_type,
                    }),
                    Some(_) => Err(AppError::BadRequest(format!(
                        "scoringEvents[{}].minuteScored must be non-negative",
                        index
                    ))),
                    None => Err(AppError::BadRequest(format!(
                        "scoringEvents[{}].minuteScored is required",
                        index
                    ))),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedCompletion {
            home_score: self.home_score,
            away_score: self.away_score,
            player_stats: self.player_stats,
            scoring_events,
        })
    }
}

impl ValidatedCompletion {
    /// Sorted, de-duplicated union of players named in stats and scoring events
    pub fn referenced_player_ids(&self) -> Vec<String> {
        self.player_stats
            .iter()
            .map(|line| line.player_id.clone())
            .chain(self.scoring_events.iter().map(|e| e.player_id.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
