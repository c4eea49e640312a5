use thiserror::Error;

use crate::model::ids::{AnswerId, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("answer text cannot be empty")]
    EmptyText,
}

/// One selectable option for a question.
///
/// Well-formed data has exactly one option with `is_correct` set per
/// question; that is an authoring invariant, not one the engine enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    id: AnswerId,
    question_id: QuestionId,
    text: String,
    is_correct: bool,
}

impl AnswerOption {
    /// Creates an answer option with validated text.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::EmptyText` if the text is blank.
    pub fn new(
        id: AnswerId,
        question_id: QuestionId,
        text: impl Into<String>,
        is_correct: bool,
    ) -> Result<Self, AnswerError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(AnswerError::EmptyText);
        }
        Ok(Self {
            id,
            question_id,
            text,
            is_correct,
        })
    }

    #[must_use]
    pub fn id(&self) -> AnswerId {
        self.id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

/// Returns the canonical correct option: the first one flagged correct.
///
/// `None` when the data is malformed and no option is flagged. With more
/// than one flagged option, iteration order decides.
#[must_use]
pub fn correct_option(options: &[AnswerOption]) -> Option<&AnswerOption> {
    options.iter().find(|o| o.is_correct())
}
