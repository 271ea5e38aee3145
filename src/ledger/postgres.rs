use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Postgres, Row, Transaction};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use super::models::{
    InjurySeverity, MatchModel, MatchStatus, PlayerInjuryModel, PlayerMatchStatsModel,
    PlayerModel, ScoreModel, TeamModel, TournamentModel,
};
use super::repository::{LedgerRepository, LedgerTransaction};
use super::snapshot::LedgerSnapshot;
use crate::shared::AppError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const MATCH_COLUMNS: &str = "id, tournament_id, home_team_id, away_team_id, match_date, status, \
     home_score, away_score, stadium, referee, season";
const PLAYER_COLUMNS: &str =
    "id, first_name, last_name, nationality, position, birthdate, jersey_number, team_id";

/// Maps a sqlx error onto the ledger's error kinds, logging the failure
fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        let code = e
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.to_string());
        warn!(error = %e, context, "Ledger query failed");
        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => AppError::Conflict(format!("{}: duplicate record", context)),
            Some(FOREIGN_KEY_VIOLATION) => {
                AppError::BadRequest(format!("{}: referenced record not found", context))
            }
            _ => AppError::DatabaseError(e.to_string()),
        }
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, AppError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| AppError::DatabaseError(format!("column {}: {}", name, e)))
}

fn team_from_row(row: &PgRow) -> Result<TeamModel, AppError> {
    Ok(TeamModel {
        id: column(row, "id")?,
        name: column(row, "name")?,
        city: column(row, "city")?,
        country: column(row, "country")?,
    })
}

fn player_from_row(row: &PgRow) -> Result<PlayerModel, AppError> {
    Ok(PlayerModel {
        id: column(row, "id")?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        nationality: column(row, "nationality")?,
        position: column(row, "position")?,
        birthdate: column(row, "birthdate")?,
        jersey_number: column(row, "jersey_number")?,
        team_id: column(row, "team_id")?,
    })
}

fn tournament_from_row(row: &PgRow) -> Result<TournamentModel, AppError> {
    Ok(TournamentModel {
        id: column(row, "id")?,
        name: column(row, "name")?,
        start_date: column(row, "start_date")?,
        end_date: column(row, "end_date")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<MatchModel, AppError> {
    let status: String = column(row, "status")?;
    Ok(MatchModel {
        id: column(row, "id")?,
        tournament_id: column(row, "tournament_id")?,
        home_team_id: column(row, "home_team_id")?,
        away_team_id: column(row, "away_team_id")?,
        match_date: column(row, "match_date")?,
        status: MatchStatus::from_str(&status)
            .map_err(|_| AppError::DatabaseError(format!("unknown match status {}", status)))?,
        home_score: column(row, "home_score")?,
        away_score: column(row, "away_score")?,
        stadium: column(row, "stadium")?,
        referee: column(row, "referee")?,
        season: column(row, "season")?,
    })
}

fn stats_from_row(row: &PgRow) -> Result<PlayerMatchStatsModel, AppError> {
    Ok(PlayerMatchStatsModel {
        player_id: column(row, "player_id")?,
        match_id: column(row, "match_id")?,
        minutes_played: column(row, "minutes_played")?,
        goals: column(row, "goals")?,
        assists: column(row, "assists")?,
        yellow_cards: column(row, "yellow_cards")?,
        red_cards: column(row, "red_cards")?,
        shots_on_target: column(row, "shots_on_target")?,
    })
}

fn score_from_row(row: &PgRow) -> Result<ScoreModel, AppError> {
    Ok(ScoreModel {
        id: column(row, "id")?,
        match_id: column(row, "match_id")?,
        player_id: column(row, "player_id")?,
        minute_scored: column(row, "minute_scored")?,
        goal_type: column(row, "goal_type")?,
        result: column(row, "result")?,
    })
}

fn injury_from_row(row: &PgRow) -> Result<PlayerInjuryModel, AppError> {
    let severity: String = column(row, "severity")?;
    Ok(PlayerInjuryModel {
        id: column(row, "id")?,
        player_id: column(row, "player_id")?,
        injury_start: column(row, "injury_start")?,
        injury_end: column(row, "injury_end")?,
        severity: InjurySeverity::from_str(&severity)
            .map_err(|_| AppError::DatabaseError(format!("unknown severity {}", severity)))?,
    })
}

/// PostgreSQL implementation of the ledger repository
///
/// Expects the schema in `migrations/0001_ledger.sql`.
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_rows<T>(
        &self,
        sql: &str,
        context: &'static str,
        map: fn(&PgRow) -> Result<T, AppError>,
    ) -> Result<Vec<T>, AppError> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(context))?;
        rows.iter().map(map).collect()
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    #[instrument(skip(self, team))]
    async fn insert_team(&self, team: &TeamModel) -> Result<(), AppError> {
        debug!(team_id = %team.id, name = %team.name, "Inserting team in database");

        sqlx::query("INSERT INTO teams (id, name, city, country) VALUES ($1, $2, $3, $4)")
            .bind(&team.id)
            .bind(&team.name)
            .bind(&team.city)
            .bind(&team.country)
            .execute(&self.pool)
            .await
            .map_err(db_error("insert team"))?;
        Ok(())
    }

    #[instrument(skip(self, player))]
    async fn insert_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, "Inserting player in database");

        sqlx::query(
            "INSERT INTO players (id, first_name, last_name, nationality, position, birthdate, jersey_number, team_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&player.id)
        .bind(&player.first_name)
        .bind(&player.last_name)
        .bind(&player.nationality)
        .bind(&player.position)
        .bind(player.birthdate)
        .bind(player.jersey_number)
        .bind(&player.team_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("insert player"))?;
        Ok(())
    }

    #[instrument(skip(self, tournament))]
    async fn insert_tournament(&self, tournament: &TournamentModel) -> Result<(), AppError> {
        debug!(tournament_id = %tournament.id, "Inserting tournament in database");

        sqlx::query("INSERT INTO tournaments (id, name, start_date, end_date) VALUES ($1, $2, $3, $4)")
            .bind(&tournament.id)
            .bind(&tournament.name)
            .bind(tournament.start_date)
            .bind(tournament.end_date)
            .execute(&self.pool)
            .await
            .map_err(db_error("insert tournament"))?;
        Ok(())
    }

    #[instrument(skip(self, fixture))]
    async fn insert_match(&self, fixture: &MatchModel) -> Result<(), AppError> {
        debug!(match_id = %fixture.id, "Inserting match in database");

        if fixture.home_team_id == fixture.away_team_id {
            return Err(AppError::BadRequest(
                "Home and away teams must differ".to_string(),
            ));
        }

        sqlx::query(&format!(
            "INSERT INTO matches ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            MATCH_COLUMNS
        ))
        .bind(&fixture.id)
        .bind(&fixture.tournament_id)
        .bind(&fixture.home_team_id)
        .bind(&fixture.away_team_id)
        .bind(fixture.match_date)
        .bind(fixture.status.as_ref())
        .bind(fixture.home_score)
        .bind(fixture.away_score)
        .bind(&fixture.stadium)
        .bind(&fixture.referee)
        .bind(&fixture.season)
        .execute(&self.pool)
        .await
        .map_err(db_error("insert match"))?;
        Ok(())
    }

    #[instrument(skip(self, injury))]
    async fn insert_injury(&self, injury: &PlayerInjuryModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO player_injuries (id, player_id, injury_start, injury_end, severity) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&injury.id)
        .bind(&injury.player_id)
        .bind(injury.injury_start)
        .bind(injury.injury_end)
        .bind(injury.severity.as_ref())
        .execute(&self.pool)
        .await
        .map_err(db_error("insert injury"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_match(&self, match_id: &str) -> Result<(), AppError> {
        let existing = self.get_match(match_id).await?;
        match existing {
            None => return Err(AppError::NotFound("Match not found".to_string())),
            Some(m) if m.is_completed() => {
                warn!(match_id = %match_id, "Refusing to delete completed match");
                return Err(AppError::Conflict(
                    "Cannot delete completed match".to_string(),
                ));
            }
            Some(_) => {}
        }

        // The status guard in the WHERE clause covers a completion racing this delete.
        let result = sqlx::query("DELETE FROM matches WHERE id = $1 AND status <> 'completed'")
            .bind(match_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete match"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Cannot delete completed match".to_string(),
            ));
        }
        debug!(match_id = %match_id, "Match deleted from database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS))
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get match"))?;

        row.as_ref().map(match_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn snapshot(&self) -> Result<LedgerSnapshot, AppError> {
        let snapshot = LedgerSnapshot {
            teams: self
                .fetch_rows(
                    "SELECT id, name, city, country FROM teams ORDER BY id",
                    "load teams",
                    team_from_row,
                )
                .await?,
            players: self
                .fetch_rows(
                    &format!("SELECT {} FROM players ORDER BY id", PLAYER_COLUMNS),
                    "load players",
                    player_from_row,
                )
                .await?,
            tournaments: self
                .fetch_rows(
                    "SELECT id, name, start_date, end_date FROM tournaments ORDER BY id",
                    "load tournaments",
                    tournament_from_row,
                )
                .await?,
            matches: self
                .fetch_rows(
                    &format!("SELECT {} FROM matches ORDER BY id", MATCH_COLUMNS),
                    "load matches",
                    match_from_row,
                )
                .await?,
            player_stats: self
                .fetch_rows(
                    "SELECT player_id, match_id, minutes_played, goals, assists, yellow_cards, red_cards, shots_on_target \
                     FROM player_match_stats ORDER BY match_id, player_id",
                    "load player stats",
                    stats_from_row,
                )
                .await?,
            scores: self
                .fetch_rows(
                    "SELECT id, match_id, player_id, minute_scored, goal_type, result FROM scores ORDER BY id",
                    "load scores",
                    score_from_row,
                )
                .await?,
            injuries: self
                .fetch_rows(
                    "SELECT id, player_id, injury_start, injury_end, severity FROM player_injuries ORDER BY id",
                    "load injuries",
                    injury_from_row,
                )
                .await?,
        };

        debug!(
            matches = snapshot.matches.len(),
            scores = snapshot.scores.len(),
            "Ledger snapshot loaded from database"
        );
        Ok(snapshot)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, AppError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin transaction"))?;
        Ok(Box::new(PostgresLedgerTransaction { tx }))
    }
}

/// Wraps a sqlx transaction; sqlx rolls back automatically if it is dropped uncommitted.
pub struct PostgresLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PostgresLedgerTransaction {
    #[instrument(skip(self))]
    async fn lock_match(&mut self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM matches WHERE id = $1 FOR UPDATE",
            MATCH_COLUMNS
        ))
        .bind(match_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("lock match"))?;

        debug!(match_id = %match_id, found = row.is_some(), "Match row locked");
        row.as_ref().map(match_from_row).transpose()
    }

    async fn load_players(&mut self, player_ids: &[String]) -> Result<Vec<PlayerModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM players WHERE id = ANY($1)",
            PLAYER_COLUMNS
        ))
        .bind(player_ids.to_vec())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("load players"))?;

        rows.iter().map(player_from_row).collect()
    }

    async fn complete_match(
        &mut self,
        match_id: &str,
        home_score: i32,
        away_score: i32,
    ) -> Result<MatchModel, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE matches SET home_score = $2, away_score = $3, status = $4 WHERE id = $1 RETURNING {}",
            MATCH_COLUMNS
        ))
        .bind(match_id)
        .bind(home_score)
        .bind(away_score)
        .bind(MatchStatus::Completed.as_ref())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("complete match"))?
        .ok_or_else(|| AppError::NotFound("Match not found".to_string()))?;

        match_from_row(&row)
    }

    async fn upsert_player_stats(
        &mut self,
        stats: &PlayerMatchStatsModel,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO player_match_stats \
             (player_id, match_id, minutes_played, goals, assists, yellow_cards, red_cards, shots_on_target) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (player_id, match_id) DO UPDATE SET \
             minutes_played = EXCLUDED.minutes_played, goals = EXCLUDED.goals, \
             assists = EXCLUDED.assists, yellow_cards = EXCLUDED.yellow_cards, \
             red_cards = EXCLUDED.red_cards, shots_on_target = EXCLUDED.shots_on_target",
        )
        .bind(&stats.player_id)
        .bind(&stats.match_id)
        .bind(stats.minutes_played)
        .bind(stats.goals)
        .bind(stats.assists)
        .bind(stats.yellow_cards)
        .bind(stats.red_cards)
        .bind(stats.shots_on_target)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("upsert player stats"))?;
        Ok(())
    }

    async fn replace_scores(
        &mut self,
        match_id: &str,
        scores: &[ScoreModel],
    ) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM scores WHERE match_id = $1")
            .bind(match_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete scores"))?;

        for score in scores {
            sqlx::query(
                "INSERT INTO scores (id, match_id, player_id, minute_scored, goal_type, result) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&score.id)
            .bind(&score.match_id)
            .bind(&score.player_id)
            .bind(score.minute_scored)
            .bind(&score.goal_type)
            .bind(score.result)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("insert score"))?;
        }

        debug!(
            match_id = %match_id,
            removed = deleted.rows_affected(),
            inserted = scores.len(),
            "Scores replaced"
        );
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let this = *self;
        this.tx.commit().await.map_err(db_error("commit"))?;
        info!("Ledger transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        let this = *self;
        this.tx.rollback().await.map_err(db_error("rollback"))?;
        debug!("Ledger transaction rolled back");
        Ok(())
    }
}
