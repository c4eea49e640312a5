use std::collections::HashMap;

use quiz_core::model::{SpecialtyId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_score_row, ser, specialty_id_from_i64};
use crate::repository::{ScoreRecord, ScoreRepository, ScoreRow, StorageError};

#[async_trait::async_trait]
impl ScoreRepository for SqliteRepository {
    async fn append_score(&self, record: &ScoreRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO scores (user_id, specialty_id, score, recorded_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(id_to_i64("user_id", record.user_id.value())?)
        .bind(id_to_i64("specialty_id", record.specialty_id.value())?)
        .bind(i64::from(record.score))
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn scores_for_user(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<ScoreRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, specialty_id, score, recorded_at
            FROM scores
            WHERE user_id = ?1
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(id_to_i64("user_id", user.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_score_row(&row)?);
        }
        Ok(out)
    }

    async fn top_scores(
        &self,
        specialty: SpecialtyId,
        limit: u32,
    ) -> Result<Vec<ScoreRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, specialty_id, score, recorded_at
            FROM scores
            WHERE specialty_id = ?1
            ORDER BY score DESC, recorded_at ASC, id ASC
            LIMIT ?2
            ",
        )
        .bind(id_to_i64("specialty_id", specialty.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_score_row(&row)?);
        }
        Ok(out)
    }

    async fn best_score_per_specialty(
        &self,
        user: UserId,
    ) -> Result<HashMap<SpecialtyId, i32>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT specialty_id, MAX(score) AS best
            FROM scores
            WHERE user_id = ?1
            GROUP BY specialty_id
            ",
        )
        .bind(id_to_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut best = HashMap::with_capacity(rows.len());
        for row in rows {
            let specialty =
                specialty_id_from_i64(row.try_get::<i64, _>("specialty_id").map_err(ser)?)?;
            let score: i64 = row.try_get("best").map_err(ser)?;
            let score = i32::try_from(score)
                .map_err(|_| StorageError::Serialization(format!("invalid score: {score}")))?;
            best.insert(specialty, score);
        }
        Ok(best)
    }
}
