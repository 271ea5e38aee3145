use std::collections::HashMap;

use super::types::StandingRow;
use crate::ledger::{LedgerSnapshot, MatchOutcome};

impl StandingRow {
    fn empty(team_id: &str, team_name: &str) -> Self {
        Self {
            team_id: team_id.to_string(),
            team_name: team_name.to_string(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }

    fn record(&mut self, scored: i32, conceded: i32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.goal_difference = self.goals_for - self.goals_against;

        let outcome = MatchOutcome::from_goals(scored, conceded);
        match outcome {
            MatchOutcome::Win => self.wins += 1,
            MatchOutcome::Draw => self.draws += 1,
            MatchOutcome::Loss => self.losses += 1,
        }
        self.points += outcome.points();
    }
}

/// League table over every completed match
///
/// Goals come from the stored match score. Teams without a completed match
/// are not listed. Ordered by points, then goal difference, then team name.
pub fn standings(snapshot: &LedgerSnapshot) -> Vec<StandingRow> {
    let teams = snapshot.teams_by_id();
    let mut table: HashMap<&str, StandingRow> = HashMap::new();

    for fixture in snapshot.completed_matches() {
        for (team_id, scored, conceded) in [
            (&fixture.home_team_id, fixture.home_score, fixture.away_score),
            (&fixture.away_team_id, fixture.away_score, fixture.home_score),
        ] {
            table
                .entry(team_id.as_str())
                .or_insert_with(|| {
                    let name = teams.get(team_id.as_str()).map_or("Unknown", |t| t.name.as_str());
                    StandingRow::empty(team_id, name)
                })
                .record(scored, conceded);
        }
    }

    let mut rows: Vec<StandingRow> = table.into_values().collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference.cmp(&a.goal_difference))
            .then_with(|| a.team_name.cmp(&b.team_name))
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    rows
}
