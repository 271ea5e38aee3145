use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::types::{InjuryBurdenRow, PlayerLoadRow};
use crate::ledger::LedgerSnapshot;

fn active_injuries_by_player(snapshot: &LedgerSnapshot, today: NaiveDate) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    for injury in snapshot.injuries.iter().filter(|i| i.is_active_on(today)) {
        *counts.entry(injury.player_id.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Active injuries per team on `today`. Free agents and teams without injuries are left out.
pub fn injury_burden(snapshot: &LedgerSnapshot, today: NaiveDate) -> Vec<InjuryBurdenRow> {
    let players = snapshot.players_by_id();
    let teams = snapshot.teams_by_id();

    let mut by_team: BTreeMap<&str, u32> = BTreeMap::new();
    for (player_id, count) in active_injuries_by_player(snapshot, today) {
        let Some(team_id) = players.get(player_id).and_then(|p| p.team_id.as_deref()) else {
            continue;
        };
        *by_team.entry(team_id).or_insert(0) += count;
    }

    let mut rows: Vec<InjuryBurdenRow> = by_team
        .into_iter()
        .map(|(team_id, active_injuries)| InjuryBurdenRow {
            team_id: team_id.to_string(),
            team_name: teams
                .get(team_id)
                .map_or_else(|| "Unknown".to_string(), |t| t.name.clone()),
            active_injuries,
        })
        .collect();

    rows.sort_by(|a, b| b.active_injuries.cmp(&a.active_injuries));
    rows
}

/// Minutes played against active injuries for every player
pub fn player_load_vs_active_injuries(
    snapshot: &LedgerSnapshot,
    today: NaiveDate,
) -> Vec<PlayerLoadRow> {
    let injuries = active_injuries_by_player(snapshot, today);

    let mut minutes: HashMap<&str, i64> = HashMap::new();
    for line in &snapshot.player_stats {
        *minutes.entry(line.player_id.as_str()).or_insert(0) += i64::from(line.minutes_played);
    }

    let mut rows: Vec<PlayerLoadRow> = snapshot
        .players
        .iter()
        .map(|player| PlayerLoadRow {
            player_id: player.id.clone(),
            first_name: player.first_name.clone(),
            last_name: player.last_name.clone(),
            minutes: minutes.get(player.id.as_str()).copied().unwrap_or(0),
            active_injuries: injuries.get(player.id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.active_injuries
            .cmp(&a.active_injuries)
            .then_with(|| b.minutes.cmp(&a.minutes))
    });
    rows
}
