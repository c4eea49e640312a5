use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizConfigError {
    #[error("total questions must be > 0")]
    InvalidTotalQuestions,

    #[error("initial lives must be > 0")]
    InvalidLivesInitial,
}

/// Tunable parameters for one quiz session.
///
/// Defaults match the shipped game: ten questions, +100/-30 scoring, a
/// 600-point passing threshold, three lives, shuffled questions and answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    total_questions: u32,
    points_per_correct: i32,
    points_per_incorrect: i32,
    passing_score: i32,
    shuffle_questions: bool,
    shuffle_answers: bool,
    lives_initial: u32,
}

impl QuizConfig {
    /// Creates a config with validated limits.
    ///
    /// # Errors
    ///
    /// Returns `QuizConfigError` when `total_questions` or `lives_initial`
    /// is zero.
    pub fn new(
        total_questions: u32,
        points_per_correct: i32,
        points_per_incorrect: i32,
        passing_score: i32,
        lives_initial: u32,
    ) -> Result<Self, QuizConfigError> {
        if total_questions == 0 {
            return Err(QuizConfigError::InvalidTotalQuestions);
        }
        if lives_initial == 0 {
            return Err(QuizConfigError::InvalidLivesInitial);
        }
        Ok(Self {
            total_questions,
            points_per_correct,
            points_per_incorrect,
            passing_score,
            shuffle_questions: true,
            shuffle_answers: true,
            lives_initial,
        })
    }

    /// Enable or disable shuffling of the session question queue.
    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    /// Enable or disable shuffling of answer options before display.
    #[must_use]
    pub fn with_shuffle_answers(mut self, shuffle: bool) -> Self {
        self.shuffle_answers = shuffle;
        self
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn points_per_correct(&self) -> i32 {
        self.points_per_correct
    }

    #[must_use]
    pub fn points_per_incorrect(&self) -> i32 {
        self.points_per_incorrect
    }

    #[must_use]
    pub fn passing_score(&self) -> i32 {
        self.passing_score
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    #[must_use]
    pub fn shuffle_answers(&self) -> bool {
        self.shuffle_answers
    }

    #[must_use]
    pub fn lives_initial(&self) -> u32 {
        self.lives_initial
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            total_questions: 10,
            points_per_correct: 100,
            points_per_incorrect: -30,
            passing_score: 600,
            shuffle_questions: true,
            shuffle_answers: true,
            lives_initial: 3,
        }
    }
}
