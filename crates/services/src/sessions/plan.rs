use std::collections::HashSet;

use quiz_core::model::{Question, QuizConfig};
use rand::rng;
use rand::seq::SliceRandom;

/// A planned question queue for one session.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    questions: Vec<Question>,
    /// Distinct questions the pool offered before truncation.
    available: usize,
}

impl SessionPlan {
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.available
    }

    /// How many questions short of the requested count the pool was.
    #[must_use]
    pub fn shortfall(&self, requested: u32) -> usize {
        (requested as usize).saturating_sub(self.questions.len())
    }
}

/// Builds the session queue from a candidate pool: dedupe, shuffle, truncate.
#[derive(Debug, Clone, Copy)]
pub struct SessionBuilder<'a> {
    config: &'a QuizConfig,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a QuizConfig) -> Self {
        Self { config }
    }

    /// Plans a queue of at most `total_questions` distinct questions.
    ///
    /// Duplicate IDs keep their first occurrence. A pool smaller than the
    /// requested count yields a shorter queue rather than an error.
    #[must_use]
    pub fn build(self, pool: impl IntoIterator<Item = Question>) -> SessionPlan {
        let mut seen = HashSet::new();
        let mut questions: Vec<Question> = pool
            .into_iter()
            .filter(|question| seen.insert(question.id()))
            .collect();
        let available = questions.len();

        if self.config.shuffle_questions() {
            let mut rng = rng();
            questions.shuffle(&mut rng);
        }
        questions.truncate(self.config.total_questions() as usize);

        SessionPlan {
            questions,
            available,
        }
    }
}
