use std::fmt;

use quiz_core::model::{
    AnswerId, AnswerOption, Question, QuestionId, QuizConfig, SessionOutcome, SessionResult,
    SpecialtyId, UserId,
};

use crate::error::SessionError;

//
// ─── SUBMISSION TYPES ──────────────────────────────────────────────────────────
//

/// Outcome of one answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionResult {
    pub was_correct: bool,
    pub score_delta: i32,
    pub running_score: i32,
    pub session_terminated: bool,
    /// Set on the submission that terminates the session, `None` before.
    pub terminal: Option<SessionResult>,
}

/// One answered question, kept for review after the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub question_id: QuestionId,
    pub option_id: AnswerId,
    pub was_correct: bool,
    pub score_delta: i32,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for one quiz run.
///
/// The session owns the question queue, the running score, and the terminal
/// result. All transitions are synchronous; persistence happens around them
/// in the workflow layer. Once `result` is set no further transition is
/// accepted.
pub struct QuizSession {
    user_id: UserId,
    specialty_id: SpecialtyId,
    config: QuizConfig,
    questions: Vec<Question>,
    current: usize,
    score: i32,
    submissions: Vec<SubmissionRecord>,
    current_options: Option<Vec<AnswerOption>>,
    result: Option<SessionResult>,
    score_saved: bool,
    submission_in_flight: bool,
}

impl QuizSession {
    /// Creates a session over an already planned question queue.
    ///
    /// An empty queue terminates the session immediately as a failed run
    /// with a score of zero.
    #[must_use]
    pub fn new(
        user_id: UserId,
        specialty_id: SpecialtyId,
        config: QuizConfig,
        questions: Vec<Question>,
    ) -> Self {
        let result = questions.is_empty().then(|| SessionResult {
            final_score: 0,
            passed: false,
            specialty_id,
            outcome: SessionOutcome::Completed,
        });
        Self {
            user_id,
            specialty_id,
            config,
            questions,
            current: 0,
            score: 0,
            submissions: Vec::new(),
            current_options: None,
            result,
            score_saved: false,
            submission_in_flight: false,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn specialty_id(&self) -> SpecialtyId {
        self.specialty_id
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// The question awaiting an answer, or `None` once the session ended.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.result.is_some() {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn score(&self) -> i32 {
        self.score
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.result.is_some()
    }

    #[must_use]
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Whether the terminal score reached durable storage.
    #[must_use]
    pub fn score_saved(&self) -> bool {
        self.score_saved
    }

    #[must_use]
    pub fn submissions(&self) -> &[SubmissionRecord] {
        &self.submissions
    }

    #[must_use]
    pub fn progress(&self) -> super::SessionProgress {
        super::SessionProgress {
            current_index: self.current,
            total_questions: self.questions.len(),
            score: self.score,
            remaining: self.questions.len().saturating_sub(self.current),
            is_terminated: self.result.is_some(),
        }
    }

    /// Options loaded for the current question, if any were cached yet.
    #[must_use]
    pub fn current_options(&self) -> Option<&[AnswerOption]> {
        self.current_options.as_deref()
    }

    pub(crate) fn set_current_options(&mut self, options: Vec<AnswerOption>) {
        self.current_options = Some(options);
    }

    pub(crate) fn mark_score_saved(&mut self) {
        self.score_saved = true;
    }

    /// Claims the submission slot. At most one submission may be in flight.
    pub(crate) fn begin_submission(&mut self) -> Result<(), SessionError> {
        if self.result.is_some() {
            return Err(SessionError::Terminated);
        }
        if self.submission_in_flight {
            return Err(SessionError::SubmissionInFlight);
        }
        self.submission_in_flight = true;
        Ok(())
    }

    pub(crate) fn end_submission(&mut self) {
        self.submission_in_flight = false;
    }

    /// Applies a graded answer to the session.
    ///
    /// Pure transition: scores the answer, advances the queue, and decides
    /// termination. Exhausted lives end the run at once as a failure; an
    /// emptied queue ends it against the passing threshold.
    pub fn apply_answer(
        &mut self,
        option_id: AnswerId,
        was_correct: bool,
        lives_exhausted: bool,
    ) -> Result<SubmissionResult, SessionError> {
        if self.result.is_some() {
            return Err(SessionError::Terminated);
        }
        let question = self
            .questions
            .get(self.current)
            .ok_or(SessionError::NoCurrentQuestion)?;

        let score_delta = if was_correct {
            self.config.points_per_correct()
        } else {
            self.config.points_per_incorrect()
        };
        self.score = self.score.saturating_add(score_delta);
        self.submissions.push(SubmissionRecord {
            question_id: question.id(),
            option_id,
            was_correct,
            score_delta,
        });
        self.current += 1;
        self.current_options = None;

        let terminal = if lives_exhausted {
            Some(SessionResult::from_score(
                self.score,
                self.config.passing_score(),
                self.specialty_id,
                SessionOutcome::LivesExhausted,
            ))
        } else if self.current >= self.questions.len() {
            Some(SessionResult::from_score(
                self.score,
                self.config.passing_score(),
                self.specialty_id,
                SessionOutcome::Completed,
            ))
        } else {
            None
        };
        self.result = terminal;

        Ok(SubmissionResult {
            was_correct,
            score_delta,
            running_score: self.score,
            session_terminated: terminal.is_some(),
            terminal,
        })
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("user_id", &self.user_id)
            .field("specialty_id", &self.specialty_id)
            .field("current", &self.current)
            .field("total", &self.questions.len())
            .field("score", &self.score)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}
