use std::collections::HashSet;

use quiz_core::model::{Question, QuestionId, SpecialtyId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_question_row};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO questions (id, specialty_id, text)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                specialty_id = excluded.specialty_id,
                text = excluded.text
            ",
        )
        .bind(id_to_i64("question_id", question.id().value())?)
        .bind(id_to_i64("specialty_id", question.specialty_id().value())?)
        .bind(question.text())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn questions_for_specialty(
        &self,
        specialty: SpecialtyId,
        exclude: &HashSet<QuestionId>,
    ) -> Result<Vec<Question>, StorageError> {
        let mut sql = String::from(
            r"
            SELECT id, specialty_id, text
            FROM questions
            WHERE specialty_id = ?1
            ",
        );

        if !exclude.is_empty() {
            sql.push_str(" AND id NOT IN (");
            for i in 0..exclude.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push('?');
                sql.push_str(&(i + 2).to_string());
            }
            sql.push(')');
        }
        sql.push_str(" ORDER BY id ASC");

        let mut query =
            sqlx::query(&sql).bind(id_to_i64("specialty_id", specialty.value())?);
        for id in exclude {
            query = query.bind(id_to_i64("question_id", id.value())?);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(map_question_row(&row)?);
        }
        Ok(questions)
    }
}
