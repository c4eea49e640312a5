use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{AnswerId, AnswerOption, Question, QuestionId, SpecialtyId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a final session score.
///
/// One row per terminated session; the ranking and profile screens read
/// these back, so the record keeps the timestamp alongside the score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub user_id: UserId,
    pub specialty_id: SpecialtyId,
    pub score: i32,
    pub recorded_at: DateTime<Utc>,
}

/// A score record paired with its storage row ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub id: i64,
    pub record: ScoreRecord,
}

impl ScoreRow {
    #[must_use]
    pub fn new(id: i64, record: ScoreRecord) -> Self {
        Self { id, record }
    }
}

/// Repository contract for the question bank.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or update a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Questions belonging to a specialty, excluding the given IDs.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures. An empty result is not
    /// an error.
    async fn questions_for_specialty(
        &self,
        specialty: SpecialtyId,
        exclude: &HashSet<QuestionId>,
    ) -> Result<Vec<Question>, StorageError>;
}

/// Repository contract for answer options.
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Persist or update an answer option.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the option cannot be stored.
    async fn upsert_answer(&self, answer: &AnswerOption) -> Result<(), StorageError>;

    /// All options for a question, in stable storage order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn answers_for_question(
        &self,
        question: QuestionId,
    ) -> Result<Vec<AnswerOption>, StorageError>;
}

/// Tracks which questions a user has answered correctly.
///
/// Rows are append-only and `(user, question)` is unique in the store, so a
/// duplicate write that slips past the caller's check is harmless.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Whether the user already completed this question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn has_completed(
        &self,
        user: UserId,
        question: QuestionId,
    ) -> Result<bool, StorageError>;

    /// Record a completion. Recording the same pair twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn record_completion(
        &self,
        user: UserId,
        question: QuestionId,
    ) -> Result<(), StorageError>;

    /// IDs of every question the user has completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn completed_question_ids(
        &self,
        user: UserId,
    ) -> Result<HashSet<QuestionId>, StorageError>;

    /// Wipe the user's completion history, returning the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn reset_progress(&self, user: UserId) -> Result<u64, StorageError>;
}

/// Durable backing for the shared lives counter.
#[async_trait]
pub trait LivesStore: Send + Sync {
    /// Last persisted count, or `None` if the user has no saved state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn load_lives(&self, user: UserId) -> Result<Option<u32>, StorageError>;

    /// Persist the current count.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn save_lives(&self, user: UserId, lives: u32) -> Result<(), StorageError>;
}

/// Append-only store of final session scores.
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Append a score row, returning its storage ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn append_score(&self, record: &ScoreRecord) -> Result<i64, StorageError>;

    /// Most recent scores for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn scores_for_user(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<ScoreRow>, StorageError>;

    /// Highest scores within a specialty, best first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn top_scores(
        &self,
        specialty: SpecialtyId,
        limit: u32,
    ) -> Result<Vec<ScoreRow>, StorageError>;

    /// The user's best score in each specialty they have played.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn best_score_per_specialty(
        &self,
        user: UserId,
    ) -> Result<HashMap<SpecialtyId, i32>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<QuestionId, Question>>>,
    answers: Arc<Mutex<HashMap<AnswerId, AnswerOption>>>,
    completions: Arc<Mutex<HashSet<(UserId, QuestionId)>>>,
    lives: Arc<Mutex<HashMap<UserId, u32>>>,
    scores: Arc<Mutex<Vec<ScoreRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(guard: &Arc<Mutex<T>>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
        guard
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.questions)?;
        guard.insert(question.id(), question.clone());
        Ok(())
    }

    async fn questions_for_specialty(
        &self,
        specialty: SpecialtyId,
        exclude: &HashSet<QuestionId>,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = Self::lock(&self.questions)?;
        let mut found: Vec<Question> = guard
            .values()
            .filter(|q| q.specialty_id() == specialty && !exclude.contains(&q.id()))
            .cloned()
            .collect();
        found.sort_by_key(|q| q.id().value());
        Ok(found)
    }
}

#[async_trait]
impl AnswerRepository for InMemoryRepository {
    async fn upsert_answer(&self, answer: &AnswerOption) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.answers)?;
        guard.insert(answer.id(), answer.clone());
        Ok(())
    }

    async fn answers_for_question(
        &self,
        question: QuestionId,
    ) -> Result<Vec<AnswerOption>, StorageError> {
        let guard = Self::lock(&self.answers)?;
        let mut found: Vec<AnswerOption> = guard
            .values()
            .filter(|a| a.question_id() == question)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.id().value());
        Ok(found)
    }
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn has_completed(
        &self,
        user: UserId,
        question: QuestionId,
    ) -> Result<bool, StorageError> {
        let guard = Self::lock(&self.completions)?;
        Ok(guard.contains(&(user, question)))
    }

    async fn record_completion(
        &self,
        user: UserId,
        question: QuestionId,
    ) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.completions)?;
        guard.insert((user, question));
        Ok(())
    }

    async fn completed_question_ids(
        &self,
        user: UserId,
    ) -> Result<HashSet<QuestionId>, StorageError> {
        let guard = Self::lock(&self.completions)?;
        Ok(guard
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, q)| *q)
            .collect())
    }

    async fn reset_progress(&self, user: UserId) -> Result<u64, StorageError> {
        let mut guard = Self::lock(&self.completions)?;
        let before = guard.len();
        guard.retain(|(u, _)| *u != user);
        Ok((before - guard.len()) as u64)
    }
}

#[async_trait]
impl LivesStore for InMemoryRepository {
    async fn load_lives(&self, user: UserId) -> Result<Option<u32>, StorageError> {
        let guard = Self::lock(&self.lives)?;
        Ok(guard.get(&user).copied())
    }

    async fn save_lives(&self, user: UserId, lives: u32) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.lives)?;
        guard.insert(user, lives);
        Ok(())
    }
}

#[async_trait]
impl ScoreRepository for InMemoryRepository {
    async fn append_score(&self, record: &ScoreRecord) -> Result<i64, StorageError> {
        let mut guard = Self::lock(&self.scores)?;
        let id = guard.len() as i64 + 1;
        guard.push(ScoreRow::new(id, record.clone()));
        Ok(id)
    }

    async fn scores_for_user(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<ScoreRow>, StorageError> {
        let guard = Self::lock(&self.scores)?;
        let mut found: Vec<ScoreRow> = guard
            .iter()
            .filter(|row| row.record.user_id == user)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.record
                .recorded_at
                .cmp(&a.record.recorded_at)
                .then(b.id.cmp(&a.id))
        });
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn top_scores(
        &self,
        specialty: SpecialtyId,
        limit: u32,
    ) -> Result<Vec<ScoreRow>, StorageError> {
        let guard = Self::lock(&self.scores)?;
        let mut found: Vec<ScoreRow> = guard
            .iter()
            .filter(|row| row.record.specialty_id == specialty)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.record
                .score
                .cmp(&a.record.score)
                .then(a.record.recorded_at.cmp(&b.record.recorded_at))
        });
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn best_score_per_specialty(
        &self,
        user: UserId,
    ) -> Result<HashMap<SpecialtyId, i32>, StorageError> {
        let guard = Self::lock(&self.scores)?;
        let mut best: HashMap<SpecialtyId, i32> = HashMap::new();
        for row in guard.iter().filter(|row| row.record.user_id == user) {
            best.entry(row.record.specialty_id)
                .and_modify(|s| *s = (*s).max(row.record.score))
                .or_insert(row.record.score);
        }
        Ok(best)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub completions: Arc<dyn CompletionRepository>,
    pub lives: Arc<dyn LivesStore>,
    pub scores: Arc<dyn ScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            questions: Arc::new(repo.clone()),
            answers: Arc::new(repo.clone()),
            completions: Arc::new(repo.clone()),
            lives: Arc::new(repo.clone()),
            scores: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn build_question(id: u64, specialty: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            SpecialtyId::new(specialty),
            format!("Question {id}"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn filters_questions_by_specialty_and_exclusion() {
        let repo = InMemoryRepository::new();
        for id in 5..=9 {
            repo.upsert_question(&build_question(id, 4)).await.unwrap();
        }
        repo.upsert_question(&build_question(20, 7)).await.unwrap();

        let exclude: HashSet<QuestionId> =
            [QuestionId::new(5), QuestionId::new(9)].into_iter().collect();
        let found = repo
            .questions_for_specialty(SpecialtyId::new(4), &exclude)
            .await
            .unwrap();

        let ids: Vec<u64> = found.iter().map(|q| q.id().value()).collect();
        assert_eq!(ids, vec![6, 7, 8]);
    }

    #[tokio::test]
    async fn completion_recording_is_idempotent() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let question = QuestionId::new(5);

        assert!(!repo.has_completed(user, question).await.unwrap());
        repo.record_completion(user, question).await.unwrap();
        repo.record_completion(user, question).await.unwrap();

        assert!(repo.has_completed(user, question).await.unwrap());
        assert_eq!(repo.completed_question_ids(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_progress_clears_only_that_user() {
        let repo = InMemoryRepository::new();
        repo.record_completion(UserId::new(1), QuestionId::new(5))
            .await
            .unwrap();
        repo.record_completion(UserId::new(2), QuestionId::new(5))
            .await
            .unwrap();

        let removed = repo.reset_progress(UserId::new(1)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo
            .completed_question_ids(UserId::new(1))
            .await
            .unwrap()
            .is_empty());
        assert!(repo
            .has_completed(UserId::new(2), QuestionId::new(5))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn top_scores_orders_best_first() {
        let repo = InMemoryRepository::new();
        let specialty = SpecialtyId::new(4);
        for (user, score) in [(1_u64, 300), (2, 700), (3, 500)] {
            repo.append_score(&ScoreRecord {
                user_id: UserId::new(user),
                specialty_id: specialty,
                score,
                recorded_at: fixed_now(),
            })
            .await
            .unwrap();
        }

        let top = repo.top_scores(specialty, 2).await.unwrap();
        let scores: Vec<i32> = top.iter().map(|row| row.record.score).collect();
        assert_eq!(scores, vec![700, 500]);
    }

    #[tokio::test]
    async fn best_score_per_specialty_keeps_maximum() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        for (specialty, score) in [(4_u64, 300), (4, 550), (5, 120)] {
            repo.append_score(&ScoreRecord {
                user_id: user,
                specialty_id: SpecialtyId::new(specialty),
                score,
                recorded_at: fixed_now(),
            })
            .await
            .unwrap();
        }

        let best = repo.best_score_per_specialty(user).await.unwrap();
        assert_eq!(best[&SpecialtyId::new(4)], 550);
        assert_eq!(best[&SpecialtyId::new(5)], 120);
    }
}
