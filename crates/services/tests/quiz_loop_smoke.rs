//! End-to-end runs of the quiz loop against in-memory storage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use quiz_core::model::{
    AnswerId, AnswerOption, Question, QuestionId, QuizConfig, SessionOutcome, SpecialtyId, UserId,
};
use quiz_core::time::fixed_clock;
use services::{LivesService, QuizEngine, SessionError, SessionWarning};
use storage::repository::{
    InMemoryRepository, ScoreRecord, ScoreRepository, ScoreRow, Storage, StorageError,
};

const SPECIALTY: u64 = 4;

/// Three options per question, the one matching `id * 10 + 1` is correct.
async fn seed_questions(storage: &Storage, ids: impl IntoIterator<Item = u64>) {
    for id in ids {
        let question = Question::new(
            QuestionId::new(id),
            SpecialtyId::new(SPECIALTY),
            format!("Question {id}"),
        )
        .unwrap();
        storage.questions.upsert_question(&question).await.unwrap();

        for slot in 1..=3_u64 {
            let option = AnswerOption::new(
                AnswerId::new(id * 10 + slot),
                question.id(),
                format!("Answer {slot} to question {id}"),
                slot == 1,
            )
            .unwrap();
            storage.answers.upsert_answer(&option).await.unwrap();
        }
    }
}

/// Seeds one question with an option per entry in `flags`, flagged as given.
async fn seed_question_with_flags(storage: &Storage, id: u64, flags: &[bool]) {
    let question = Question::new(
        QuestionId::new(id),
        SpecialtyId::new(SPECIALTY),
        format!("Question {id}"),
    )
    .unwrap();
    storage.questions.upsert_question(&question).await.unwrap();

    for (slot, correct) in flags.iter().enumerate() {
        let option = AnswerOption::new(
            AnswerId::new(id * 10 + slot as u64 + 1),
            question.id(),
            format!("Answer {} to question {id}", slot + 1),
            *correct,
        )
        .unwrap();
        storage.answers.upsert_answer(&option).await.unwrap();
    }
}

fn deterministic_config(total: u32, passing: i32, lives: u32) -> QuizConfig {
    QuizConfig::new(total, 100, -30, passing, lives)
        .unwrap()
        .with_shuffle_questions(false)
        .with_shuffle_answers(false)
}

async fn lives_for(storage: &Storage, user: UserId, initial: u32) -> LivesService {
    LivesService::load(user, initial, Arc::clone(&storage.lives)).await
}

fn pick(options: &[AnswerOption], correct: bool) -> AnswerId {
    options
        .iter()
        .find(|option| option.is_correct() == correct)
        .map(|option| option.id())
        .unwrap()
}

#[tokio::test]
async fn full_run_passes_and_saves_score_once() {
    let storage = Storage::in_memory();
    seed_questions(&storage, 1..=3).await;

    let engine = QuizEngine::new(fixed_clock(), deterministic_config(3, 150, 3), &storage);
    let user = UserId::new(1);
    let mut lives = lives_for(&storage, user, 3).await;

    let start = engine
        .start_session(user, SpecialtyId::new(SPECIALTY))
        .await
        .unwrap();
    assert!(start.warning.is_none());
    assert_eq!(start.total_available, 3);
    let mut session = start.session;

    // Correct, incorrect, correct: 100 - 30 + 100 = 170, over the 150 bar.
    let options = engine.load_current_answers(&mut session).await.unwrap();
    let first = engine
        .submit_answer(&mut session, &mut lives, pick(&options, true))
        .await
        .unwrap();
    assert!(first.was_correct);
    assert_eq!(first.running_score, 100);

    let options = engine.load_current_answers(&mut session).await.unwrap();
    let second = engine
        .submit_answer(&mut session, &mut lives, pick(&options, false))
        .await
        .unwrap();
    assert!(!second.was_correct);
    assert_eq!(lives.remaining(), 2);

    let options = engine.load_current_answers(&mut session).await.unwrap();
    let last = engine
        .submit_answer(&mut session, &mut lives, pick(&options, true))
        .await
        .unwrap();

    let result = last.terminal.unwrap();
    assert!(result.passed);
    assert_eq!(result.final_score, 170);
    assert_eq!(result.outcome, SessionOutcome::Completed);
    assert!(session.score_saved());

    // Exactly one persisted row, and both correct questions marked done.
    let saved = storage.scores.scores_for_user(user, 10).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].record.score, 170);
    let completed = storage.completions.completed_question_ids(user).await.unwrap();
    assert_eq!(completed.len(), 2);

    // The terminal session refuses more answers and finalize stays a no-op.
    let err = engine
        .submit_answer(&mut session, &mut lives, AnswerId::new(11))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Terminated));
    engine.finalize_score(&mut session).await.unwrap();
    assert_eq!(storage.scores.scores_for_user(user, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn exhausting_lives_fails_the_run_immediately() {
    let storage = Storage::in_memory();
    seed_questions(&storage, 1..=10).await;

    let engine = QuizEngine::new(fixed_clock(), deterministic_config(10, 600, 3), &storage);
    let user = UserId::new(1);
    let mut lives = lives_for(&storage, user, 3).await;

    let mut session = engine
        .start_session(user, SpecialtyId::new(SPECIALTY))
        .await
        .unwrap()
        .session;

    for round in 1..=3 {
        let options = engine.load_current_answers(&mut session).await.unwrap();
        let outcome = engine
            .submit_answer(&mut session, &mut lives, pick(&options, false))
            .await
            .unwrap();
        assert_eq!(outcome.session_terminated, round == 3);
    }

    let result = *session.result().unwrap();
    assert!(!result.passed);
    assert_eq!(result.outcome, SessionOutcome::LivesExhausted);
    assert_eq!(result.final_score, -90);
    assert!(lives.is_exhausted());
    assert_eq!(storage.lives.load_lives(user).await.unwrap(), Some(0));

    // Failure still writes the score row.
    let saved = storage.scores.scores_for_user(user, 10).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].record.score, -90);
}

#[tokio::test]
async fn preexhausted_lives_end_the_session_on_any_answer() {
    let storage = Storage::in_memory();
    seed_questions(&storage, 1..=2).await;

    // Lives were spent in an earlier run and persisted at zero.
    let user = UserId::new(1);
    storage.lives.save_lives(user, 0).await.unwrap();

    let engine = QuizEngine::new(fixed_clock(), deterministic_config(2, 150, 3), &storage);
    let mut lives = lives_for(&storage, user, 3).await;
    assert!(lives.is_exhausted());

    let mut session = engine
        .start_session(user, SpecialtyId::new(SPECIALTY))
        .await
        .unwrap()
        .session;
    let options = engine.load_current_answers(&mut session).await.unwrap();
    let outcome = engine
        .submit_answer(&mut session, &mut lives, pick(&options, true))
        .await
        .unwrap();

    // Even a correct answer cannot keep the run alive.
    assert!(outcome.was_correct);
    assert!(outcome.session_terminated);
    let result = outcome.terminal.unwrap();
    assert!(!result.passed);
    assert_eq!(result.outcome, SessionOutcome::LivesExhausted);
}

#[tokio::test]
async fn question_without_correct_option_grades_incorrect() {
    let storage = Storage::in_memory();
    seed_question_with_flags(&storage, 1, &[false, false, false]).await;

    let engine = QuizEngine::new(fixed_clock(), deterministic_config(1, 50, 3), &storage);
    let user = UserId::new(1);
    let mut lives = lives_for(&storage, user, 3).await;
    let mut session = engine
        .start_session(user, SpecialtyId::new(SPECIALTY))
        .await
        .unwrap()
        .session;

    let options = engine.load_current_answers(&mut session).await.unwrap();
    let outcome = engine
        .submit_answer(&mut session, &mut lives, options[0].id())
        .await
        .unwrap();

    assert!(!outcome.was_correct);
    assert_eq!(outcome.score_delta, -30);
    assert_eq!(lives.remaining(), 2);
}

#[tokio::test]
async fn every_flagged_option_grades_correct() {
    let storage = Storage::in_memory();
    seed_question_with_flags(&storage, 1, &[true, true, false]).await;
    seed_question_with_flags(&storage, 2, &[true, true, false]).await;

    let engine = QuizEngine::new(fixed_clock(), deterministic_config(2, 150, 3), &storage);
    let user = UserId::new(1);
    let mut lives = lives_for(&storage, user, 3).await;
    let mut session = engine
        .start_session(user, SpecialtyId::new(SPECIALTY))
        .await
        .unwrap()
        .session;

    // Answer each question through a different flagged option.
    let options = engine.load_current_answers(&mut session).await.unwrap();
    let flagged: Vec<AnswerId> = options
        .iter()
        .filter(|option| option.is_correct())
        .map(|option| option.id())
        .collect();
    let first = engine
        .submit_answer(&mut session, &mut lives, flagged[0])
        .await
        .unwrap();
    assert!(first.was_correct);

    let options = engine.load_current_answers(&mut session).await.unwrap();
    let flagged: Vec<AnswerId> = options
        .iter()
        .filter(|option| option.is_correct())
        .map(|option| option.id())
        .collect();
    let second = engine
        .submit_answer(&mut session, &mut lives, flagged[1])
        .await
        .unwrap();

    assert!(second.was_correct);
    assert_eq!(second.running_score, 200);
    assert_eq!(lives.remaining(), 3);
}

#[tokio::test]
async fn completed_questions_stay_out_of_new_sessions() {
    let storage = Storage::in_memory();
    seed_questions(&storage, 5..=9).await;

    let user = UserId::new(1);
    for id in [5_u64, 9] {
        storage
            .completions
            .record_completion(user, QuestionId::new(id))
            .await
            .unwrap();
    }

    let engine = QuizEngine::new(fixed_clock(), deterministic_config(10, 600, 3), &storage);
    let start = engine
        .start_session(user, SpecialtyId::new(SPECIALTY))
        .await
        .unwrap();

    assert_eq!(start.total_available, 3);
    assert_eq!(
        start.warning,
        Some(SessionWarning::NotEnoughQuestions {
            available: 3,
            requested: 10,
        })
    );
    let progress = start.session.progress();
    assert_eq!(progress.total_questions, 3);
    assert_eq!(start.first_question().unwrap().id().value(), 6);
}

#[tokio::test]
async fn empty_pool_terminates_with_persisted_zero() {
    let storage = Storage::in_memory();

    let engine = QuizEngine::new(fixed_clock(), deterministic_config(10, 600, 3), &storage);
    let user = UserId::new(1);
    let start = engine
        .start_session(user, SpecialtyId::new(SPECIALTY))
        .await
        .unwrap();

    assert!(start.session.is_terminated());
    assert!(!start.session.result().unwrap().passed);
    assert!(start.session.score_saved());

    let saved = storage.scores.scores_for_user(user, 10).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].record.score, 0);
}

#[tokio::test]
async fn unknown_option_is_rejected_without_state_change() {
    let storage = Storage::in_memory();
    seed_questions(&storage, 1..=3).await;

    let engine = QuizEngine::new(fixed_clock(), deterministic_config(3, 150, 3), &storage);
    let user = UserId::new(1);
    let mut lives = lives_for(&storage, user, 3).await;
    let mut session = engine
        .start_session(user, SpecialtyId::new(SPECIALTY))
        .await
        .unwrap()
        .session;

    engine.load_current_answers(&mut session).await.unwrap();
    let err = engine
        .submit_answer(&mut session, &mut lives, AnswerId::new(999))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::UnknownOption(_)));
    assert_eq!(session.score(), 0);
    assert_eq!(session.progress().current_index, 0);
    assert_eq!(lives.remaining(), 3);

    // The slot is free again, a valid answer goes through.
    let options = engine.load_current_answers(&mut session).await.unwrap();
    engine
        .submit_answer(&mut session, &mut lives, pick(&options, true))
        .await
        .unwrap();
}

/// Score store whose first append fails, to exercise the retry path.
#[derive(Clone)]
struct FlakyScores {
    inner: InMemoryRepository,
    fail_next: Arc<AtomicBool>,
}

#[async_trait]
impl ScoreRepository for FlakyScores {
    async fn append_score(&self, record: &ScoreRecord) -> Result<i64, StorageError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Connection("write timed out".into()));
        }
        self.inner.append_score(record).await
    }

    async fn scores_for_user(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<ScoreRow>, StorageError> {
        self.inner.scores_for_user(user, limit).await
    }

    async fn top_scores(
        &self,
        specialty: SpecialtyId,
        limit: u32,
    ) -> Result<Vec<ScoreRow>, StorageError> {
        self.inner.top_scores(specialty, limit).await
    }

    async fn best_score_per_specialty(
        &self,
        user: UserId,
    ) -> Result<std::collections::HashMap<SpecialtyId, i32>, StorageError> {
        self.inner.best_score_per_specialty(user).await
    }
}

#[tokio::test]
async fn failed_terminal_write_is_retried_by_finalize() {
    let repo = InMemoryRepository::new();
    let flaky = FlakyScores {
        inner: repo.clone(),
        fail_next: Arc::new(AtomicBool::new(true)),
    };
    let storage = Storage {
        questions: Arc::new(repo.clone()),
        answers: Arc::new(repo.clone()),
        completions: Arc::new(repo.clone()),
        lives: Arc::new(repo.clone()),
        scores: Arc::new(flaky),
    };
    seed_questions(&storage, 1..=1).await;

    let engine = QuizEngine::new(fixed_clock(), deterministic_config(1, 50, 3), &storage);
    let user = UserId::new(1);
    let mut lives = lives_for(&storage, user, 3).await;
    let mut session = engine
        .start_session(user, SpecialtyId::new(SPECIALTY))
        .await
        .unwrap()
        .session;

    let options = engine.load_current_answers(&mut session).await.unwrap();
    let outcome = engine
        .submit_answer(&mut session, &mut lives, pick(&options, true))
        .await
        .unwrap();

    // Terminated, but the write was dropped on the floor.
    assert!(outcome.session_terminated);
    assert!(!session.score_saved());
    assert!(storage.scores.scores_for_user(user, 10).await.unwrap().is_empty());

    engine.finalize_score(&mut session).await.unwrap();
    assert!(session.score_saved());
    let saved = storage.scores.scores_for_user(user, 10).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].record.score, 100);
}
