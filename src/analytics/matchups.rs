use super::math::{mean, round_to};
use super::types::{
    HeadToHead, HeadToHeadDetail, HeadToHeadSummary, PlayerVsTeam, PresenceBucket, TeamWins,
};
use crate::ledger::{LedgerSnapshot, MatchModel, MatchOutcome};

fn completed_between<'a>(
    snapshot: &'a LedgerSnapshot,
    team_a: &'a str,
    team_b: &'a str,
) -> impl Iterator<Item = &'a MatchModel> {
    snapshot
        .completed_matches()
        .filter(move |m| m.is_between(team_a, team_b))
}

/// Record of completed meetings between two teams, most recent first
pub fn head_to_head(snapshot: &LedgerSnapshot, team_a: &str, team_b: &str) -> HeadToHead {
    let teams = snapshot.teams_by_id();
    let team_name = |id: &str| teams.get(id).map_or_else(|| id.to_string(), |t| t.name.clone());

    let mut meetings: Vec<&MatchModel> = completed_between(snapshot, team_a, team_b).collect();
    meetings.sort_by(|a, b| b.match_date.cmp(&a.match_date).then_with(|| a.id.cmp(&b.id)));

    let mut summary = HeadToHeadSummary {
        team_a: TeamWins {
            id: team_a.to_string(),
            wins: 0,
        },
        team_b: TeamWins {
            id: team_b.to_string(),
            wins: 0,
        },
        draws: 0,
    };

    let details: Vec<HeadToHeadDetail> = meetings
        .into_iter()
        .map(|m| {
            match m.outcome_for(team_a) {
                Some(MatchOutcome::Win) => summary.team_a.wins += 1,
                Some(MatchOutcome::Loss) => summary.team_b.wins += 1,
                Some(MatchOutcome::Draw) | None => summary.draws += 1,
            }
            HeadToHeadDetail {
                match_id: m.id.clone(),
                home_team: team_name(&m.home_team_id),
                away_team: team_name(&m.away_team_id),
                score: format!("{} – {}", m.home_score, m.away_score),
                date: m.match_date,
            }
        })
        .collect();

    HeadToHead { summary, details }
}

/// Player's output against one opponent, `None` if either side is unknown
///
/// Only completed matches between the player's current team and the
/// opponent count. A free agent has no such matches and gets zero totals.
pub fn player_vs_team(
    snapshot: &LedgerSnapshot,
    player_id: &str,
    opponent_team_id: &str,
) -> Option<PlayerVsTeam> {
    let player = snapshot.player(player_id)?;
    let opponent = snapshot.team(opponent_team_id)?;

    let match_ids: Vec<&str> = match player.team_id.as_deref() {
        Some(own_team) => completed_between(snapshot, own_team, opponent_team_id)
            .map(|m| m.id.as_str())
            .collect(),
        None => Vec::new(),
    };

    let mut row = PlayerVsTeam {
        player_id: player.id.clone(),
        first_name: player.first_name.clone(),
        last_name: player.last_name.clone(),
        opponent_team_id: opponent.id.clone(),
        opponent_team_name: opponent.name.clone(),
        total_goals: 0,
        total_assists: 0,
        total_minutes: 0,
        appearances: 0,
    };

    for line in snapshot
        .player_stats
        .iter()
        .filter(|s| s.player_id == player_id && match_ids.contains(&s.match_id.as_str()))
    {
        row.total_goals += i64::from(line.goals);
        row.total_assists += i64::from(line.assists);
        row.total_minutes += i64::from(line.minutes_played);
        if line.appeared() {
            row.appearances += 1;
        }
    }

    Some(row)
}

/// Team goals against an opponent with and without the player on the pitch
///
/// Present means a stat line with minutes > 0. Buckets without matches are
/// left out and the present bucket comes first.
pub fn presence_impact(
    snapshot: &LedgerSnapshot,
    player_id: &str,
    opponent_team_id: &str,
) -> Vec<PresenceBucket> {
    let Some(own_team) = snapshot
        .player(player_id)
        .and_then(|p| p.team_id.as_deref())
    else {
        return Vec::new();
    };

    // (goals, matches) for present and absent
    let mut present = (0i64, 0u32);
    let mut absent = (0i64, 0u32);

    for fixture in completed_between(snapshot, own_team, opponent_team_id) {
        let Some((scored, _)) = fixture.goals_for(own_team) else {
            continue;
        };
        let played = snapshot
            .player_stats
            .iter()
            .any(|s| s.player_id == player_id && s.match_id == fixture.id && s.appeared());

        let bucket = if played { &mut present } else { &mut absent };
        bucket.0 += i64::from(scored);
        bucket.1 += 1;
    }

    [(true, present), (false, absent)]
        .into_iter()
        .filter(|(_, (_, samples))| *samples > 0)
        .map(|(is_present, (goals, samples))| PresenceBucket {
            is_present,
            avg_goals: round_to(mean(goals as f64, samples), 2),
            samples,
        })
        .collect()
}
