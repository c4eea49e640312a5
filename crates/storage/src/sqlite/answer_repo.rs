use quiz_core::model::{AnswerOption, QuestionId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_answer_row};
use crate::repository::{AnswerRepository, StorageError};

#[async_trait::async_trait]
impl AnswerRepository for SqliteRepository {
    async fn upsert_answer(&self, answer: &AnswerOption) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO answers (id, question_id, text, is_correct)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                question_id = excluded.question_id,
                text = excluded.text,
                is_correct = excluded.is_correct
            ",
        )
        .bind(id_to_i64("answer_id", answer.id().value())?)
        .bind(id_to_i64("question_id", answer.question_id().value())?)
        .bind(answer.text())
        .bind(i64::from(answer.is_correct()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn answers_for_question(
        &self,
        question: QuestionId,
    ) -> Result<Vec<AnswerOption>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, question_id, text, is_correct
            FROM answers
            WHERE question_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("question_id", question.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut answers = Vec::with_capacity(rows.len());
        for row in rows {
            answers.push(map_answer_row(&row)?);
        }
        Ok(answers)
    }
}
