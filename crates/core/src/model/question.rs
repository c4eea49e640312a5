use thiserror::Error;

use crate::model::ids::{QuestionId, SpecialtyId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,
}

/// A multiple-choice question scoped to one medical specialty.
///
/// Immutable once loaded; sessions reference questions but never edit them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    specialty_id: SpecialtyId,
    text: String,
}

impl Question {
    /// Creates a question with validated text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the text is blank.
    pub fn new(
        id: QuestionId,
        specialty_id: SpecialtyId,
        text: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        Ok(Self {
            id,
            specialty_id,
            text,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn specialty_id(&self) -> SpecialtyId {
        self.specialty_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}
