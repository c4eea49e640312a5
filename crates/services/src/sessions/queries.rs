//! Storage reads for session startup, with graceful degradation.
//!
//! A session should start even when parts of storage misbehave: a failed
//! completion lookup falls back to an empty set (the user may see repeats),
//! and a failed question fetch yields an empty pool (the session terminates
//! at once). Both paths log a warning instead of surfacing an error.

use std::collections::HashSet;

use quiz_core::model::{AnswerOption, Question, QuestionId, SpecialtyId, UserId};
use rand::rng;
use rand::seq::SliceRandom;
use storage::repository::{AnswerRepository, CompletionRepository, QuestionRepository};
use tracing::warn;

use crate::error::SessionError;

/// Completed question IDs for the user, empty on storage failure.
pub(crate) async fn completed_ids_degraded(
    user: UserId,
    completions: &dyn CompletionRepository,
) -> HashSet<QuestionId> {
    match completions.completed_question_ids(user).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(user = %user, error = %err, "completion lookup failed, allowing repeats");
            HashSet::new()
        }
    }
}

/// Candidate questions for a new session, excluding completed ones.
pub(crate) async fn load_pool(
    user: UserId,
    specialty: SpecialtyId,
    questions: &dyn QuestionRepository,
    completions: &dyn CompletionRepository,
) -> Vec<Question> {
    let completed = completed_ids_degraded(user, completions).await;
    match questions.questions_for_specialty(specialty, &completed).await {
        Ok(pool) => pool,
        Err(err) => {
            warn!(specialty = %specialty, error = %err, "question fetch failed");
            Vec::new()
        }
    }
}

/// Options for a question, shuffled for display when requested.
///
/// Read failures propagate; without options the question cannot be shown.
pub(crate) async fn load_answers(
    question: QuestionId,
    answers: &dyn AnswerRepository,
    shuffle: bool,
) -> Result<Vec<AnswerOption>, SessionError> {
    let mut options = answers.answers_for_question(question).await?;
    if shuffle {
        let mut rng = rng();
        options.shuffle(&mut rng);
    }
    Ok(options)
}
