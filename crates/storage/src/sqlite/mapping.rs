use quiz_core::model::{AnswerId, AnswerOption, Question, QuestionId, SpecialtyId, UserId};
use sqlx::Row;

use crate::repository::{ScoreRecord, ScoreRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn answer_id_from_i64(v: i64) -> Result<AnswerId, StorageError> {
    Ok(AnswerId::new(i64_to_u64("answer_id", v)?))
}

pub(crate) fn specialty_id_from_i64(v: i64) -> Result<SpecialtyId, StorageError> {
    Ok(SpecialtyId::new(i64_to_u64("specialty_id", v)?))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let specialty = specialty_id_from_i64(row.try_get::<i64, _>("specialty_id").map_err(ser)?)?;
    let text: String = row.try_get("text").map_err(ser)?;
    Question::new(id, specialty, text).map_err(ser)
}

pub(crate) fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnswerOption, StorageError> {
    let id = answer_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let question = question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?;
    let text: String = row.try_get("text").map_err(ser)?;
    let is_correct: i64 = row.try_get("is_correct").map_err(ser)?;
    AnswerOption::new(id, question, text, is_correct != 0).map_err(ser)
}

pub(crate) fn map_score_row(row: &sqlx::sqlite::SqliteRow) -> Result<ScoreRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let user_id = user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?;
    let specialty_id =
        specialty_id_from_i64(row.try_get::<i64, _>("specialty_id").map_err(ser)?)?;
    let score: i64 = row.try_get("score").map_err(ser)?;
    let score = i32::try_from(score)
        .map_err(|_| StorageError::Serialization(format!("invalid score: {score}")))?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;
    Ok(ScoreRow::new(
        id,
        ScoreRecord {
            user_id,
            specialty_id,
            score,
            recorded_at,
        },
    ))
}
