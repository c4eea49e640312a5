use std::collections::HashSet;

use quiz_core::model::{QuestionId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, question_id_from_i64, ser};
use crate::repository::{CompletionRepository, StorageError};

#[async_trait::async_trait]
impl CompletionRepository for SqliteRepository {
    async fn has_completed(
        &self,
        user: UserId,
        question: QuestionId,
    ) -> Result<bool, StorageError> {
        let row = sqlx::query(
            r"
            SELECT 1 FROM user_completions
            WHERE user_id = ?1 AND question_id = ?2
            ",
        )
        .bind(id_to_i64("user_id", user.value())?)
        .bind(id_to_i64("question_id", question.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn record_completion(
        &self,
        user: UserId,
        question: QuestionId,
    ) -> Result<(), StorageError> {
        // The primary key on (user_id, question_id) absorbs duplicate writes.
        sqlx::query(
            r"
            INSERT INTO user_completions (user_id, question_id)
            VALUES (?1, ?2)
            ON CONFLICT(user_id, question_id) DO NOTHING
            ",
        )
        .bind(id_to_i64("user_id", user.value())?)
        .bind(id_to_i64("question_id", question.value())?)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn completed_question_ids(
        &self,
        user: UserId,
    ) -> Result<HashSet<QuestionId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_id FROM user_completions
            WHERE user_id = ?1
            ",
        )
        .bind(id_to_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            ids.insert(question_id_from_i64(
                row.try_get::<i64, _>("question_id").map_err(ser)?,
            )?);
        }
        Ok(ids)
    }

    async fn reset_progress(&self, user: UserId) -> Result<u64, StorageError> {
        let res = sqlx::query(
            r"
            DELETE FROM user_completions WHERE user_id = ?1
            ",
        )
        .bind(id_to_i64("user_id", user.value())?)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.rows_affected())
    }
}
