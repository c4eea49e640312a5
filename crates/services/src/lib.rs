#![forbid(unsafe_code)]

pub mod error;
pub mod lives;
pub mod score_board;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::SessionError;
pub use lives::{LivesService, LivesUpdate};
pub use score_board::{ScoreBoardEntry, ScoreBoardService};
pub use sessions::{
    QuizEngine, QuizSession, SessionProgress, SessionStart, SessionWarning, SubmissionRecord,
    SubmissionResult,
};
