use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::types::{ActorContext, CompleteMatchRequest, ValidatedCompletion};
use crate::ledger::{LedgerRepository, LedgerTransaction, MatchModel, MatchStatus, ScoreModel};
use crate::shared::AppError;

/// Service for the one write path of the ledger: finalizing a match
pub struct MatchCompletionService {
    repository: Arc<dyn LedgerRepository>,
}

impl MatchCompletionService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    /// Completes a match in a single unit of work
    ///
    /// Either every write lands (final score, per-player stats, scores with
    /// their result indicator) or none does. Completing an already completed
    /// match fails with `Conflict` whatever the payload.
    #[instrument(skip(self, request, actor), fields(actor = ?actor.user_id))]
    pub async fn complete_match(
        &self,
        match_id: &str,
        request: CompleteMatchRequest,
        actor: &ActorContext,
    ) -> Result<MatchModel, AppError> {
        let completion = request.validate()?;

        let mut tx = self.repository.begin().await?;
        match apply_completion(tx.as_mut(), match_id, &completion).await {
            Ok(completed) => {
                tx.commit().await?;
                info!(
                    match_id = %match_id,
                    home_score = completed.home_score,
                    away_score = completed.away_score,
                    stat_lines = completion.player_stats.len(),
                    scoring_events = completion.scoring_events.len(),
                    "Match completed"
                );
                Ok(completed)
            }
            Err(err) => {
                warn!(match_id = %match_id, error = %err, "Match completion aborted");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after aborted completion");
                }
                Err(err)
            }
        }
    }
}

async fn apply_completion(
    tx: &mut dyn LedgerTransaction,
    match_id: &str,
    completion: &ValidatedCompletion,
) -> Result<MatchModel, AppError> {
    let fixture = tx
        .lock_match(match_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))?;

    if fixture.status == MatchStatus::Completed {
        return Err(AppError::Conflict("Match already completed".to_string()));
    }

    let player_ids = completion.referenced_player_ids();
    let roster: HashMap<String, Option<String>> = if player_ids.is_empty() {
        HashMap::new()
    } else {
        tx.load_players(&player_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.team_id))
            .collect()
    };

    for player_id in &player_ids {
        match roster.get(player_id) {
            None => {
                return Err(AppError::BadRequest(format!(
                    "Player {} not found",
                    player_id
                )))
            }
            Some(Some(team_id)) if fixture.has_team(team_id) => {}
            Some(_) => {
                return Err(AppError::BadRequest(format!(
                    "Player {} must belong to a participating team",
                    player_id
                )))
            }
        }
    }
    debug!(players = player_ids.len(), "Roster membership verified");

    let completed = tx
        .complete_match(match_id, completion.home_score, completion.away_score)
        .await?;

    for line in &completion.player_stats {
        tx.upsert_player_stats(&line.to_model(match_id)).await?;
    }

    let scores: Vec<ScoreModel> = completion
        .scoring_events
        .iter()
        .map(|event| {
            let result = roster
                .get(&event.player_id)
                .and_then(|team_id| team_id.as_deref())
                .and_then(|team_id| completed.outcome_for(team_id))
                .map(|outcome| outcome.result_indicator());
            ScoreModel::new(
                match_id,
                event.player_id.clone(),
                event.minute_scored,
                event.goal_type.clone(),
                result,
            )
        })
        .collect();
    tx.replace_scores(match_id, &scores).await?;

    Ok(completed)
}
