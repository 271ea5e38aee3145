use std::collections::BTreeMap;

use super::math::{per_90, round_to, Accumulator};
use super::types::{CareerAverageRow, ConsistencyMetric, ConsistencyRow, GoalsPer90Row};
use crate::ledger::{LedgerSnapshot, PlayerMatchStatsModel, PlayerModel};

#[derive(Default)]
struct Totals {
    matches: u32,
    goals: i64,
    assists: i64,
    minutes: i64,
    shots_on_target: i64,
}

impl Totals {
    fn add(&mut self, line: &PlayerMatchStatsModel) {
        self.matches += 1;
        self.goals += i64::from(line.goals);
        self.assists += i64::from(line.assists);
        self.minutes += i64::from(line.minutes_played);
        self.shots_on_target += i64::from(line.shots_on_target);
    }

    fn average(&self, total: i64, places: i32) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            round_to(total as f64 / self.matches as f64, places)
        }
    }
}

/// Sums stat lines per player, keyed by player id. Lines for unknown players are skipped.
fn totals_by_player<'a>(
    snapshot: &'a LedgerSnapshot,
    player_id: Option<&str>,
) -> BTreeMap<&'a str, (&'a PlayerModel, Totals)> {
    let players = snapshot.players_by_id();
    let mut totals: BTreeMap<&str, (&PlayerModel, Totals)> = BTreeMap::new();

    for line in &snapshot.player_stats {
        if player_id.is_some_and(|id| id != line.player_id) {
            continue;
        }
        let Some(&player) = players.get(line.player_id.as_str()) else {
            continue;
        };
        totals
            .entry(player.id.as_str())
            .or_insert_with(|| (player, Totals::default()))
            .1
            .add(line);
    }
    totals
}

/// Goals per 90 minutes for every player with at least one stat line, highest first
pub fn goals_per_90(snapshot: &LedgerSnapshot) -> Vec<GoalsPer90Row> {
    let mut rows: Vec<GoalsPer90Row> = totals_by_player(snapshot, None)
        .into_values()
        .map(|(player, totals)| GoalsPer90Row {
            player_id: player.id.clone(),
            name: player.full_name(),
            team_id: player.team_id.clone(),
            goals: totals.goals,
            minutes: totals.minutes,
            goals_per_90: round_to(per_90(totals.goals, totals.minutes), 2),
        })
        .collect();

    rows.sort_by(|a, b| b.goals_per_90.total_cmp(&a.goals_per_90));
    rows
}

/// Career totals and per-match averages, optionally for a single player
pub fn career_averages(snapshot: &LedgerSnapshot, player_id: Option<&str>) -> Vec<CareerAverageRow> {
    let mut rows: Vec<CareerAverageRow> = totals_by_player(snapshot, player_id)
        .into_values()
        .map(|(player, totals)| CareerAverageRow {
            player_id: player.id.clone(),
            name: player.full_name(),
            team_id: player.team_id.clone(),
            matches: totals.matches,
            total_goals: totals.goals,
            total_assists: totals.assists,
            total_minutes: totals.minutes,
            total_shots_on_target: totals.shots_on_target,
            avg_goals: totals.average(totals.goals, 2),
            avg_assists: totals.average(totals.assists, 2),
            avg_minutes: totals.average(totals.minutes, 1),
            avg_shots_on_target: totals.average(totals.shots_on_target, 2),
            goals_per_90: round_to(per_90(totals.goals, totals.minutes), 2),
        })
        .collect();

    rows.sort_by(|a, b| b.goals_per_90.total_cmp(&a.goals_per_90));
    rows
}

/// Average and sample standard deviation of a per-player series
///
/// `Result` samples are the player's scores with a recorded result indicator;
/// `Goals` and `Assists` samples are the player's stat lines.
pub fn consistency(
    snapshot: &LedgerSnapshot,
    player_id: Option<&str>,
    metric: ConsistencyMetric,
) -> Vec<ConsistencyRow> {
    let samples: Vec<(&str, f64)> = match metric {
        ConsistencyMetric::Result => snapshot
            .scores
            .iter()
            .filter_map(|s| s.result.map(|r| (s.player_id.as_str(), r)))
            .collect(),
        ConsistencyMetric::Goals => snapshot
            .player_stats
            .iter()
            .map(|s| (s.player_id.as_str(), f64::from(s.goals)))
            .collect(),
        ConsistencyMetric::Assists => snapshot
            .player_stats
            .iter()
            .map(|s| (s.player_id.as_str(), f64::from(s.assists)))
            .collect(),
    };

    let mut series: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for (id, value) in samples {
        if player_id.is_some_and(|wanted| wanted != id) {
            continue;
        }
        series.entry(id).or_default().push(value);
    }

    let players = snapshot.players_by_id();
    let mut rows: Vec<ConsistencyRow> = series
        .into_iter()
        .filter_map(|(id, acc)| {
            let player = players.get(id)?;
            Some(ConsistencyRow {
                player_id: player.id.clone(),
                name: player.full_name(),
                metric,
                samples: acc.n,
                average: round_to(acc.mean(), 2),
                std_dev: round_to(acc.std_dev(), 2),
            })
        })
        .collect();

    rows.sort_by(|a, b| b.average.total_cmp(&a.average));
    rows
}
