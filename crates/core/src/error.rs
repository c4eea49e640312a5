use thiserror::Error;

use crate::model::{AnswerError, QuestionError, QuizConfigError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Config(#[from] QuizConfigError),
}
