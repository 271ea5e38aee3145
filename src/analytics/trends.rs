use chrono::{DateTime, Datelike, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::math::Accumulator;
use super::types::{NationalityWinRate, PlayerWinRate, TopScorerRow, TrendBucket, TrendPoint};
use crate::ledger::{LedgerSnapshot, PlayerModel};

pub const DEFAULT_TOP_SCORERS_LIMIT: usize = 10;

/// Scores that carry a result indicator, paired with the scorer
fn resolved_scores(snapshot: &LedgerSnapshot) -> impl Iterator<Item = (&PlayerModel, f64)> + '_ {
    let players = snapshot.players_by_id();
    snapshot.scores.iter().filter_map(move |score| {
        let result = score.result?;
        let player = *players.get(score.player_id.as_str())?;
        Some((player, result))
    })
}

/// Average result indicator per scorer, best first
pub fn player_win_rate(snapshot: &LedgerSnapshot) -> Vec<PlayerWinRate> {
    let mut by_player: BTreeMap<&str, (&PlayerModel, Accumulator)> = BTreeMap::new();
    for (player, result) in resolved_scores(snapshot) {
        by_player
            .entry(player.id.as_str())
            .or_insert_with(|| (player, Accumulator::default()))
            .1
            .push(result);
    }

    let mut rows: Vec<PlayerWinRate> = by_player
        .into_values()
        .map(|(player, acc)| PlayerWinRate {
            player_id: player.id.clone(),
            first_name: player.first_name.clone(),
            last_name: player.last_name.clone(),
            avg_result: acc.mean(),
            samples: acc.n,
        })
        .collect();

    rows.sort_by(|a, b| b.avg_result.total_cmp(&a.avg_result));
    rows
}

/// Average result indicator per scorer nationality; players without one share a `None` group
pub fn win_rate_by_nationality(snapshot: &LedgerSnapshot) -> Vec<NationalityWinRate> {
    let mut by_nationality: BTreeMap<Option<&str>, Accumulator> = BTreeMap::new();
    for (player, result) in resolved_scores(snapshot) {
        by_nationality
            .entry(player.nationality.as_deref())
            .or_default()
            .push(result);
    }

    let mut rows: Vec<NationalityWinRate> = by_nationality
        .into_iter()
        .map(|(nationality, acc)| NationalityWinRate {
            nationality: nationality.map(str::to_string),
            avg_result: acc.mean(),
            samples: acc.n,
        })
        .collect();

    rows.sort_by(|a, b| b.avg_result.total_cmp(&a.avg_result));
    rows
}

impl TrendBucket {
    /// Sortable calendar label for a kickoff time
    pub fn label(self, at: DateTime<Utc>) -> String {
        match self {
            TrendBucket::Day => at.format("%Y-%m-%d").to_string(),
            TrendBucket::Week => {
                let week = at.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            TrendBucket::Month => at.format("%Y-%m").to_string(),
        }
    }
}

/// Average result indicator per calendar bucket of the match date, oldest first
pub fn seasonal_trend(snapshot: &LedgerSnapshot, bucket: TrendBucket) -> Vec<TrendPoint> {
    let matches = snapshot.matches_by_id();
    let mut series: BTreeMap<String, Accumulator> = BTreeMap::new();

    for score in &snapshot.scores {
        let (Some(result), Some(fixture)) = (score.result, matches.get(score.match_id.as_str()))
        else {
            continue;
        };
        series
            .entry(bucket.label(fixture.match_date))
            .or_default()
            .push(result);
    }

    series
        .into_iter()
        .map(|(bucket_label, acc)| TrendPoint {
            bucket_label,
            avg_result: acc.mean(),
            samples: acc.n,
        })
        .collect()
}

/// Ranked scorers over one tournament's completed matches
///
/// Ties on goals go to more assists, then to the lower player id.
pub fn top_scorers_by_tournament(
    snapshot: &LedgerSnapshot,
    tournament_id: &str,
    limit: usize,
) -> Vec<TopScorerRow> {
    let in_tournament: HashSet<&str> = snapshot
        .completed_matches()
        .filter(|m| m.tournament_id == tournament_id)
        .map(|m| m.id.as_str())
        .collect();
    if in_tournament.is_empty() {
        return Vec::new();
    }

    let players = snapshot.players_by_id();
    let mut totals: HashMap<&str, TopScorerRow> = HashMap::new();
    let tournament_name = snapshot
        .tournament(tournament_id)
        .map_or_else(|| "Tournament".to_string(), |t| t.name.clone());

    for line in snapshot
        .player_stats
        .iter()
        .filter(|s| in_tournament.contains(s.match_id.as_str()))
    {
        let Some(&player) = players.get(line.player_id.as_str()) else {
            continue;
        };
        let row = totals.entry(player.id.as_str()).or_insert_with(|| TopScorerRow {
            rank: 0,
            player_id: player.id.clone(),
            first_name: player.first_name.clone(),
            last_name: player.last_name.clone(),
            team_id: player.team_id.clone(),
            total_goals: 0,
            total_assists: 0,
            appearances: 0,
            total_minutes: 0,
            total_points: 0,
            tournament_id: tournament_id.to_string(),
            tournament_name: tournament_name.clone(),
        });
        row.total_goals += i64::from(line.goals);
        row.total_assists += i64::from(line.assists);
        row.total_minutes += i64::from(line.minutes_played);
        row.total_points = row.total_goals + row.total_assists;
        if line.appeared() {
            row.appearances += 1;
        }
    }

    let mut rows: Vec<TopScorerRow> = totals.into_values().collect();
    rows.sort_by(|a, b| {
        b.total_goals
            .cmp(&a.total_goals)
            .then_with(|| b.total_assists.cmp(&a.total_assists))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    rows.truncate(limit);
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index as u32 + 1;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{kickoff, SnapshotBuilder};
    use rstest::rstest;

    fn season() -> SnapshotBuilder {
        SnapshotBuilder::new()
            .team("a", "Alpha")
            .team("b", "Bravo")
            .tournament("cup", "Cup")
            .tournament("league", "League")
            .player("p1", "Ana Silva", Some("a"))
            .player("p2", "Ben Okafor", Some("b"))
            .player("p3", "Cy Moreau", Some("a"))
            .nationality("p1", "PT")
            .nationality("p3", "PT")
            .nationality("p2", "NG")
            .completed("m1", "cup", "a", "b", "2024-03-01", 2, 1)
            .completed("m2", "cup", "b", "a", "2024-03-20", 1, 1)
            .completed("m3", "league", "a", "b", "2024-04-02", 0, 3)
    }

    #[rstest]
    #[case(TrendBucket::Day, "2024-03-01")]
    #[case(TrendBucket::Week, "2024-W09")]
    #[case(TrendBucket::Month, "2024-03")]
    fn test_bucket_labels(#[case] bucket: TrendBucket, #[case] expected: &str) {
        assert_eq!(bucket.label(kickoff("2024-03-01")), expected);
    }

    #[test]
    fn test_week_label_uses_iso_year() {
        // 2021-01-01 falls in ISO week 53 of 2020
        assert_eq!(TrendBucket::Week.label(kickoff("2021-01-01")), "2020-W53");
    }

    #[test]
    fn test_player_win_rate_excludes_unresolved_scores() {
        let snapshot = season()
            .score("m1", "p1", 10, Some(1.0))
            .score("m2", "p1", 50, Some(0.5))
            .score("m1", "p2", 70, Some(0.0))
            .score("m3", "p2", 20, None)
            .build();

        let rows = player_win_rate(&snapshot);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player_id, "p1");
        assert_eq!(rows[0].avg_result, 0.75);
        assert_eq!(rows[0].samples, 2);
        assert_eq!(rows[1].samples, 1);
    }

    #[test]
    fn test_win_rate_by_nationality_groups_scorers() {
        let snapshot = season()
            .score("m1", "p1", 10, Some(1.0))
            .score("m3", "p3", 50, Some(0.0))
            .score("m3", "p2", 70, Some(1.0))
            .build();

        let rows = win_rate_by_nationality(&snapshot);
        assert_eq!(rows[0].nationality.as_deref(), Some("NG"));
        assert_eq!(rows[1].nationality.as_deref(), Some("PT"));
        assert_eq!(rows[1].avg_result, 0.5);
        assert_eq!(rows[1].samples, 2);
    }

    #[test]
    fn test_seasonal_trend_orders_labels() {
        let snapshot = season()
            .score("m3", "p2", 10, Some(1.0))
            .score("m1", "p1", 10, Some(1.0))
            .score("m2", "p1", 10, Some(0.5))
            .build();

        let points = seasonal_trend(&snapshot, TrendBucket::Month);
        assert_eq!(
            points,
            vec![
                TrendPoint {
                    bucket_label: "2024-03".to_string(),
                    avg_result: 0.75,
                    samples: 2
                },
                TrendPoint {
                    bucket_label: "2024-04".to_string(),
                    avg_result: 1.0,
                    samples: 1
                },
            ]
        );
    }

    #[test]
    fn test_top_scorers_tie_breaks_and_limit() {
        let snapshot = season()
            .stats("p1", "m1", 90, 2, 0)
            .stats("p2", "m1", 90, 1, 1)
            .stats("p3", "m1", 30, 1, 1)
            .stats("p2", "m2", 90, 1, 0)
            .stats("p3", "m2", 0, 0, 0)
            .stats("p2", "m3", 90, 3, 0)
            .build();

        let rows = top_scorers_by_tournament(&snapshot, "cup", 10);
        let ids: Vec<&str> = rows.iter().map(|r| r.player_id.as_str()).collect();
        // p1 and p2 both on 2 goals, p2 has the assist
        assert_eq!(ids, vec!["p2", "p1", "p3"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].total_points, 3);
        assert_eq!(rows[0].tournament_name, "Cup");
        assert_eq!(rows[2].appearances, 1);

        let limited = top_scorers_by_tournament(&snapshot, "cup", 1);
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].player_id, "p2");
    }

    #[test]
    fn test_top_scorers_unknown_tournament_is_empty() {
        let snapshot = season().stats("p1", "m1", 90, 1, 0).build();
        assert!(top_scorers_by_tournament(&snapshot, "nope", 10).is_empty());
    }
}
