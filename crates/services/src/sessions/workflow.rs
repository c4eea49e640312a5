//! Orchestration of a quiz run against storage.
//!
//! `QuizEngine` wires the pure session state machine to the repositories:
//! it plans the queue, grades submissions, records completions, spends
//! lives, and persists the terminal score exactly once. Write failures on
//! the hot path are logged and absorbed so a flaky store never interrupts
//! play; `finalize_score` exists to retry the one write that matters.

use std::fmt;
use std::sync::Arc;

use quiz_core::model::{
    AnswerId, AnswerOption, Question, QuestionId, QuizConfig, SpecialtyId, UserId,
};
use storage::repository::{
    AnswerRepository, CompletionRepository, QuestionRepository, ScoreRecord, ScoreRepository,
    Storage,
};
use tracing::{info, warn};

use super::plan::SessionBuilder;
use super::queries;
use super::service::{QuizSession, SubmissionResult};
use crate::Clock;
use crate::error::SessionError;
use crate::lives::LivesService;

//
// ─── START TYPES ───────────────────────────────────────────────────────────────
//

/// Non-fatal conditions noticed while starting a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionWarning {
    /// The pool offered fewer questions than the config asked for.
    NotEnoughQuestions { available: usize, requested: u32 },
}

/// A freshly started session plus startup diagnostics.
#[derive(Debug)]
pub struct SessionStart {
    pub session: QuizSession,
    /// Distinct uncompleted questions the pool offered.
    pub total_available: usize,
    pub warning: Option<SessionWarning>,
}

impl SessionStart {
    #[must_use]
    pub fn first_question(&self) -> Option<&Question> {
        self.session.current_question()
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Drives quiz sessions against the configured repositories.
#[derive(Clone)]
pub struct QuizEngine {
    clock: Clock,
    config: QuizConfig,
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
    completions: Arc<dyn CompletionRepository>,
    scores: Arc<dyn ScoreRepository>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(clock: Clock, config: QuizConfig, storage: &Storage) -> Self {
        Self {
            clock,
            config,
            questions: Arc::clone(&storage.questions),
            answers: Arc::clone(&storage.answers),
            completions: Arc::clone(&storage.completions),
            scores: Arc::clone(&storage.scores),
        }
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Starts a session for the user within a specialty.
    ///
    /// Completed questions are excluded from the pool; a short pool yields
    /// a warning and a shorter queue. An empty pool produces a session that
    /// is already terminated as failed, with its zero score persisted.
    pub async fn start_session(
        &self,
        user_id: UserId,
        specialty_id: SpecialtyId,
    ) -> Result<SessionStart, SessionError> {
        let pool = queries::load_pool(
            user_id,
            specialty_id,
            self.questions.as_ref(),
            self.completions.as_ref(),
        )
        .await;

        let plan = SessionBuilder::new(&self.config).build(pool);
        let total_available = plan.available();
        let shortfall = plan.shortfall(self.config.total_questions());
        let warning = (shortfall > 0).then(|| SessionWarning::NotEnoughQuestions {
            available: plan.len(),
            requested: self.config.total_questions(),
        });
        if let Some(warning) = warning {
            warn!(user = %user_id, specialty = %specialty_id, ?warning, "starting short session");
        }

        let mut session = QuizSession::new(
            user_id,
            specialty_id,
            self.config.clone(),
            plan.into_questions(),
        );
        if session.is_terminated() {
            self.persist_score(&mut session).await;
        } else {
            info!(
                user = %user_id,
                specialty = %specialty_id,
                questions = session.progress().total_questions,
                "session started"
            );
        }

        Ok(SessionStart {
            session,
            total_available,
            warning,
        })
    }

    /// Loads and caches the options for the current question.
    ///
    /// The cached set is what `submit_answer` validates against, so the
    /// grading matches exactly what was displayed.
    pub async fn load_current_answers(
        &self,
        session: &mut QuizSession,
    ) -> Result<Vec<AnswerOption>, SessionError> {
        let question = session
            .current_question()
            .ok_or(SessionError::NoCurrentQuestion)?;
        let options = queries::load_answers(
            question.id(),
            self.answers.as_ref(),
            self.config.shuffle_answers(),
        )
        .await?;
        session.set_current_options(options.clone());
        Ok(options)
    }

    /// Grades the chosen option and advances the session.
    ///
    /// At most one submission may be in flight per session; overlapping
    /// calls get `SubmissionInFlight`. A correct answer records the
    /// question as completed, an incorrect one spends a life. The terminal
    /// submission persists the final score.
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        lives: &mut LivesService,
        option_id: AnswerId,
    ) -> Result<SubmissionResult, SessionError> {
        session.begin_submission()?;
        let outcome = self.grade_and_apply(session, lives, option_id).await;
        session.end_submission();
        outcome
    }

    async fn grade_and_apply(
        &self,
        session: &mut QuizSession,
        lives: &mut LivesService,
        option_id: AnswerId,
    ) -> Result<SubmissionResult, SessionError> {
        let question_id = session
            .current_question()
            .ok_or(SessionError::NoCurrentQuestion)?
            .id();
        let options = match session.current_options() {
            Some(cached) => cached.to_vec(),
            None => {
                queries::load_answers(
                    question_id,
                    self.answers.as_ref(),
                    self.config.shuffle_answers(),
                )
                .await?
            }
        };
        let chosen = options
            .iter()
            .find(|option| option.id() == option_id)
            .ok_or(SessionError::UnknownOption(option_id))?;
        let was_correct = chosen.is_correct();

        // A counter that was already at zero ends the run whatever the
        // answer; only wrong answers spend a further life.
        let mut lives_exhausted = lives.is_exhausted();
        if was_correct {
            self.record_completion(session.user_id(), question_id).await;
        } else {
            lives_exhausted = lives.decrement().await.exhausted;
        }

        let result = session.apply_answer(option_id, was_correct, lives_exhausted)?;
        if result.session_terminated {
            self.persist_score(session).await;
        }
        Ok(result)
    }

    /// Retries the terminal score write after `submit_answer` absorbed a
    /// failure. Idempotent: a score already saved is not written again.
    ///
    /// # Errors
    ///
    /// Returns `NotTerminated` while the session is still running, or the
    /// storage error when the write fails again.
    pub async fn finalize_score(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        if session.score_saved() {
            return Ok(());
        }
        let Some(result) = session.result().copied() else {
            return Err(SessionError::NotTerminated);
        };

        let record = ScoreRecord {
            user_id: session.user_id(),
            specialty_id: result.specialty_id,
            score: result.final_score,
            recorded_at: self.clock.now(),
        };
        self.scores.append_score(&record).await?;
        session.mark_score_saved();
        Ok(())
    }

    /// Marks the question completed unless it already is. Check and write
    /// failures are logged and absorbed; the store's uniqueness constraint
    /// backstops a duplicate that slips through.
    async fn record_completion(&self, user: UserId, question: QuestionId) {
        match self.completions.has_completed(user, question).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                warn!(user = %user, question = %question, error = %err, "completion check failed");
                return;
            }
        }
        if let Err(err) = self.completions.record_completion(user, question).await {
            warn!(user = %user, question = %question, error = %err, "failed to record completion");
        }
    }

    /// Persists the terminal score exactly once. A failed write leaves the
    /// saved flag clear so `finalize_score` can retry.
    async fn persist_score(&self, session: &mut QuizSession) {
        if session.score_saved() {
            return;
        }
        let Some(result) = session.result().copied() else {
            return;
        };

        let record = ScoreRecord {
            user_id: session.user_id(),
            specialty_id: result.specialty_id,
            score: result.final_score,
            recorded_at: self.clock.now(),
        };
        match self.scores.append_score(&record).await {
            Ok(_) => {
                session.mark_score_saved();
                info!(
                    user = %session.user_id(),
                    specialty = %result.specialty_id,
                    score = result.final_score,
                    passed = result.passed,
                    "final score saved"
                );
            }
            Err(err) => {
                warn!(user = %session.user_id(), error = %err, "failed to persist final score");
            }
        }
    }
}

impl fmt::Debug for QuizEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
