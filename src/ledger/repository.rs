use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, instrument, warn};

use super::models::{
    MatchModel, MatchStatus, PlayerInjuryModel, PlayerMatchStatsModel, PlayerModel, ScoreModel,
    TeamModel, TournamentModel,
};
use super::snapshot::LedgerSnapshot;
use crate::shared::AppError;

/// Trait for ledger repository operations
///
/// Roster inserts are the seam the CRUD layer (and tests) use to populate the
/// ledger. Match results, per-player stats and scores are only ever written
/// through a [`LedgerTransaction`].
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn insert_team(&self, team: &TeamModel) -> Result<(), AppError>;
    async fn insert_player(&self, player: &PlayerModel) -> Result<(), AppError>;
    async fn insert_tournament(&self, tournament: &TournamentModel) -> Result<(), AppError>;
    async fn insert_match(&self, fixture: &MatchModel) -> Result<(), AppError>;
    async fn insert_injury(&self, injury: &PlayerInjuryModel) -> Result<(), AppError>;

    /// Removes a fixture that has not been completed yet
    async fn delete_match(&self, match_id: &str) -> Result<(), AppError>;

    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError>;

    /// Reads every table into a [`LedgerSnapshot`]
    async fn snapshot(&self) -> Result<LedgerSnapshot, AppError>;

    /// Opens a unit of work. Dropping it without `commit` discards every staged write.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, AppError>;
}

/// A unit of work over the ledger
///
/// Writes become visible to other readers only on `commit`. The row lock taken
/// by `lock_match` is held until the transaction is committed, rolled back or
/// dropped.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Locks the match row for the rest of the transaction and returns it
    async fn lock_match(&mut self, match_id: &str) -> Result<Option<MatchModel>, AppError>;

    async fn load_players(&mut self, player_ids: &[String]) -> Result<Vec<PlayerModel>, AppError>;

    /// Writes the final score and marks the match completed
    async fn complete_match(
        &mut self,
        match_id: &str,
        home_score: i32,
        away_score: i32,
    ) -> Result<MatchModel, AppError>;

    /// Inserts or fully overwrites the counters keyed by (player_id, match_id)
    async fn upsert_player_stats(&mut self, stats: &PlayerMatchStatsModel)
        -> Result<(), AppError>;

    /// Deletes every score of the match, then inserts `scores`
    async fn replace_scores(&mut self, match_id: &str, scores: &[ScoreModel])
        -> Result<(), AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
struct LedgerState {
    teams: HashMap<String, TeamModel>,
    players: HashMap<String, PlayerModel>,
    tournaments: HashMap<String, TournamentModel>,
    matches: HashMap<String, MatchModel>,
    player_stats: HashMap<(String, String), PlayerMatchStatsModel>,
    scores: Vec<ScoreModel>,
    injuries: HashMap<String, PlayerInjuryModel>,
}

/// Per-match mutexes standing in for row locks
///
/// An entry lives only while some caller holds or waits on it; `release`
/// drops it once the map holds the last reference.
#[derive(Debug, Default, Clone)]
struct MatchLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl MatchLocks {
    fn lock_for(&self, match_id: &str) -> Result<Arc<AsyncMutex<()>>, AppError> {
        let mut locks = self.locks.lock().map_err(|_| {
            warn!(match_id = %match_id, "Match lock table poisoned");
            AppError::Internal
        })?;
        Ok(locks
            .entry(match_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    /// Call after the guard for `match_id` has been dropped
    fn release(&self, match_id: &str) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        if locks
            .get(match_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(match_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

/// In-memory implementation of LedgerRepository for development and testing
///
/// Committed state lives behind a single RwLock; a transaction stages its
/// writes and applies them under one write guard on commit, so readers never
/// observe a half-completed match.
#[derive(Debug, Default)]
pub struct InMemoryLedgerRepository {
    state: Arc<RwLock<LedgerState>>,
    match_locks: MatchLocks,
}

impl InMemoryLedgerRepository {
    /// Creates a new empty in-memory ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Caller holds the match lock
    async fn delete_unlocked(&self, match_id: &str) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        match state.matches.get(match_id) {
            None => Err(AppError::NotFound("Match not found".to_string())),
            Some(m) if m.is_completed() => {
                warn!(match_id = %match_id, "Refusing to delete completed match");
                Err(AppError::Conflict(
                    "Cannot delete completed match".to_string(),
                ))
            }
            Some(_) => {
                state.matches.remove(match_id);
                debug!(match_id = %match_id, "Match deleted from memory");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    #[instrument(skip(self, team))]
    async fn insert_team(&self, team: &TeamModel) -> Result<(), AppError> {
        debug!(team_id = %team.id, name = %team.name, "Inserting team in memory");

        let mut state = self.state.write().await;
        if state.teams.contains_key(&team.id) {
            return Err(AppError::DatabaseError("Team already exists".to_string()));
        }
        if state.teams.values().any(|t| t.name == team.name) {
            warn!(name = %team.name, "Team name already taken");
            return Err(AppError::Conflict(format!(
                "Team name {} already exists",
                team.name
            )));
        }
        state.teams.insert(team.id.clone(), team.clone());
        Ok(())
    }

    #[instrument(skip(self, player))]
    async fn insert_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, "Inserting player in memory");

        let mut state = self.state.write().await;
        if state.players.contains_key(&player.id) {
            return Err(AppError::DatabaseError("Player already exists".to_string()));
        }
        if let Some(team_id) = &player.team_id {
            if !state.teams.contains_key(team_id) {
                return Err(AppError::BadRequest(format!("Team {} not found", team_id)));
            }
            let jersey_taken = state.players.values().any(|p| {
                p.team_id.as_deref() == Some(team_id.as_str())
                    && p.jersey_number == player.jersey_number
            });
            if jersey_taken {
                warn!(team_id = %team_id, jersey = player.jersey_number, "Jersey number taken");
                return Err(AppError::Conflict(format!(
                    "Jersey number {} already used in team",
                    player.jersey_number
                )));
            }
        }
        state.players.insert(player.id.clone(), player.clone());
        Ok(())
    }

    #[instrument(skip(self, tournament))]
    async fn insert_tournament(&self, tournament: &TournamentModel) -> Result<(), AppError> {
        debug!(tournament_id = %tournament.id, "Inserting tournament in memory");

        let mut state = self.state.write().await;
        if state.tournaments.contains_key(&tournament.id) {
            return Err(AppError::DatabaseError(
                "Tournament already exists".to_string(),
            ));
        }
        if state.tournaments.values().any(|t| t.name == tournament.name) {
            return Err(AppError::Conflict(format!(
                "Tournament name {} already exists",
                tournament.name
            )));
        }
        state
            .tournaments
            .insert(tournament.id.clone(), tournament.clone());
        Ok(())
    }

    #[instrument(skip(self, fixture))]
    async fn insert_match(&self, fixture: &MatchModel) -> Result<(), AppError> {
        debug!(match_id = %fixture.id, "Inserting match in memory");

        if fixture.home_team_id == fixture.away_team_id {
            return Err(AppError::BadRequest(
                "Home and away teams must differ".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        if state.matches.contains_key(&fixture.id) {
            return Err(AppError::DatabaseError("Match already exists".to_string()));
        }
        if !state.tournaments.contains_key(&fixture.tournament_id) {
            return Err(AppError::BadRequest(format!(
                "Tournament {} not found",
                fixture.tournament_id
            )));
        }
        for team_id in [&fixture.home_team_id, &fixture.away_team_id] {
            if !state.teams.contains_key(team_id) {
                return Err(AppError::BadRequest(format!("Team {} not found", team_id)));
            }
        }
        state.matches.insert(fixture.id.clone(), fixture.clone());
        Ok(())
    }

    #[instrument(skip(self, injury))]
    async fn insert_injury(&self, injury: &PlayerInjuryModel) -> Result<(), AppError> {
        debug!(injury_id = %injury.id, player_id = %injury.player_id, "Inserting injury in memory");

        let mut state = self.state.write().await;
        if !state.players.contains_key(&injury.player_id) {
            return Err(AppError::BadRequest(format!(
                "Player {} not found",
                injury.player_id
            )));
        }
        state.injuries.insert(injury.id.clone(), injury.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_match(&self, match_id: &str) -> Result<(), AppError> {
        let guard = self.match_locks.lock_for(match_id)?.lock_owned().await;
        let result = self.delete_unlocked(match_id).await;
        drop(guard);
        self.match_locks.release(match_id);
        result
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        let state = self.state.read().await;
        Ok(state.matches.get(match_id).cloned())
    }

    #[instrument(skip(self))]
    async fn snapshot(&self) -> Result<LedgerSnapshot, AppError> {
        let state = self.state.read().await;

        let mut snapshot = LedgerSnapshot {
            teams: state.teams.values().cloned().collect(),
            players: state.players.values().cloned().collect(),
            tournaments: state.tournaments.values().cloned().collect(),
            matches: state.matches.values().cloned().collect(),
            player_stats: state.player_stats.values().cloned().collect(),
            scores: state.scores.clone(),
            injuries: state.injuries.values().cloned().collect(),
        };
        drop(state);

        snapshot.teams.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.players.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.tournaments.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.matches.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.player_stats.sort_by(|a, b| {
            (a.match_id.as_str(), a.player_id.as_str())
                .cmp(&(b.match_id.as_str(), b.player_id.as_str()))
        });
        snapshot.scores.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.injuries.sort_by(|a, b| a.id.cmp(&b.id));

        debug!(
            matches = snapshot.matches.len(),
            scores = snapshot.scores.len(),
            "Ledger snapshot taken from memory"
        );
        Ok(snapshot)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, AppError> {
        Ok(Box::new(InMemoryLedgerTransaction {
            state: Arc::clone(&self.state),
            match_locks: self.match_locks.clone(),
            match_guard: None,
            locked_match_id: None,
            staged: Vec::new(),
        }))
    }
}

#[derive(Debug)]
enum StagedWrite {
    MatchResult(MatchModel),
    PlayerStats(PlayerMatchStatsModel),
    ReplaceScores {
        match_id: String,
        scores: Vec<ScoreModel>,
    },
}

pub struct InMemoryLedgerTransaction {
    state: Arc<RwLock<LedgerState>>,
    match_locks: MatchLocks,
    match_guard: Option<OwnedMutexGuard<()>>,
    locked_match_id: Option<String>,
    staged: Vec<StagedWrite>,
}

impl InMemoryLedgerTransaction {
    /// Drops the match guard, then its lock table entry if nobody else wants it
    fn unlock(&mut self) {
        self.match_guard = None;
        if let Some(match_id) = self.locked_match_id.take() {
            self.match_locks.release(&match_id);
        }
    }

    fn ensure_locked(&self) -> Result<(), AppError> {
        if self.match_guard.is_none() {
            return Err(AppError::DatabaseError(
                "Write attempted without a locked match row".to_string(),
            ));
        }
        Ok(())
    }

    /// Latest view of a match inside this transaction
    async fn current_match(&self, match_id: &str) -> Option<MatchModel> {
        let staged = self.staged.iter().rev().find_map(|write| match write {
            StagedWrite::MatchResult(m) if m.id == match_id => Some(m.clone()),
            _ => None,
        });
        match staged {
            Some(m) => Some(m),
            None => self.state.read().await.matches.get(match_id).cloned(),
        }
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryLedgerTransaction {
    #[instrument(skip(self))]
    async fn lock_match(&mut self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        self.unlock();
        let lock = self.match_locks.lock_for(match_id)?;
        self.locked_match_id = Some(match_id.to_string());
        self.match_guard = Some(lock.lock_owned().await);
        debug!(match_id = %match_id, "Match row locked in memory");

        Ok(self.current_match(match_id).await)
    }

    async fn load_players(&mut self, player_ids: &[String]) -> Result<Vec<PlayerModel>, AppError> {
        let state = self.state.read().await;
        Ok(player_ids
            .iter()
            .filter_map(|id| state.players.get(id).cloned())
            .collect())
    }

    async fn complete_match(
        &mut self,
        match_id: &str,
        home_score: i32,
        away_score: i32,
    ) -> Result<MatchModel, AppError> {
        self.ensure_locked()?;

        let mut fixture = self
            .current_match(match_id)
            .await
            .ok_or_else(|| AppError::NotFound("Match not found".to_string()))?;
        fixture.home_score = home_score;
        fixture.away_score = away_score;
        fixture.status = MatchStatus::Completed;

        self.staged.push(StagedWrite::MatchResult(fixture.clone()));
        Ok(fixture)
    }

    async fn upsert_player_stats(
        &mut self,
        stats: &PlayerMatchStatsModel,
    ) -> Result<(), AppError> {
        self.ensure_locked()?;
        self.staged.push(StagedWrite::PlayerStats(stats.clone()));
        Ok(())
    }

    async fn replace_scores(
        &mut self,
        match_id: &str,
        scores: &[ScoreModel],
    ) -> Result<(), AppError> {
        self.ensure_locked()?;
        self.staged.push(StagedWrite::ReplaceScores {
            match_id: match_id.to_string(),
            scores: scores.to_vec(),
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let mut this = *self;
        let staged = std::mem::take(&mut this.staged);
        let write_count = staged.len();

        let mut state = this.state.write().await;
        for write in staged {
            match write {
                StagedWrite::MatchResult(fixture) => {
                    state.matches.insert(fixture.id.clone(), fixture);
                }
                StagedWrite::PlayerStats(stats) => {
                    state
                        .player_stats
                        .insert((stats.player_id.clone(), stats.match_id.clone()), stats);
                }
                StagedWrite::ReplaceScores { match_id, scores } => {
                    state.scores.retain(|s| s.match_id != match_id);
                    state.scores.extend(scores);
                }
            }
        }
        drop(state);

        info!(writes = write_count, "Ledger transaction committed in memory");
        // The match guard drops here, after the writes are visible.
        this.unlock();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        let mut this = *self;
        debug!(
            discarded_writes = this.staged.len(),
            "Ledger transaction rolled back in memory"
        );
        this.staged.clear();
        this.unlock();
        Ok(())
    }
}

impl Drop for InMemoryLedgerTransaction {
    fn drop(&mut self) {
        self.unlock();
    }
}
