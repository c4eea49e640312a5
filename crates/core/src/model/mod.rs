mod answer;
mod config;
mod ids;
mod question;
mod result;

pub use answer::{AnswerError, AnswerOption, correct_option};
pub use config::{QuizConfig, QuizConfigError};
pub use ids::{AnswerId, ParseIdError, QuestionId, SpecialtyId, UserId};
pub use question::{Question, QuestionError};
pub use result::{SessionOutcome, SessionResult};
