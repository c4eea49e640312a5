//! Read side of the score history: rankings, per-user history, totals.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{SpecialtyId, UserId};
use serde::Serialize;
use storage::repository::{ScoreRepository, ScoreRow, Storage};

use crate::error::SessionError;

/// One entry on a score board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBoardEntry {
    pub user_id: UserId,
    pub specialty_id: SpecialtyId,
    pub score: i32,
    pub recorded_at: DateTime<Utc>,
}

impl From<ScoreRow> for ScoreBoardEntry {
    fn from(row: ScoreRow) -> Self {
        Self {
            user_id: row.record.user_id,
            specialty_id: row.record.specialty_id,
            score: row.record.score,
            recorded_at: row.record.recorded_at,
        }
    }
}

/// Queries over persisted session scores.
#[derive(Clone)]
pub struct ScoreBoardService {
    scores: Arc<dyn ScoreRepository>,
}

impl ScoreBoardService {
    #[must_use]
    pub fn new(storage: &Storage) -> Self {
        Self {
            scores: Arc::clone(&storage.scores),
        }
    }

    /// Highest scores within a specialty, best first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the read fails.
    pub async fn top_scores(
        &self,
        specialty: SpecialtyId,
        limit: u32,
    ) -> Result<Vec<ScoreBoardEntry>, SessionError> {
        let rows = self.scores.top_scores(specialty, limit).await?;
        Ok(rows.into_iter().map(ScoreBoardEntry::from).collect())
    }

    /// The user's most recent scores, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the read fails.
    pub async fn recent_scores(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<ScoreBoardEntry>, SessionError> {
        let rows = self.scores.scores_for_user(user, limit).await?;
        Ok(rows.into_iter().map(ScoreBoardEntry::from).collect())
    }

    /// The user's best score in each specialty they have played.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the read fails.
    pub async fn best_score_per_specialty(
        &self,
        user: UserId,
    ) -> Result<HashMap<SpecialtyId, i32>, SessionError> {
        Ok(self.scores.best_score_per_specialty(user).await?)
    }

    /// The user's career total: the sum of their best score per specialty.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the read fails.
    pub async fn career_score(&self, user: UserId) -> Result<i32, SessionError> {
        let best = self.best_score_per_specialty(user).await?;
        Ok(best.values().sum())
    }
}
