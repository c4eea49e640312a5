//! Quiz session planning, state, and orchestration.

mod plan;
mod progress;
mod queries;
mod service;
mod workflow;

pub use plan::{SessionBuilder, SessionPlan};
pub use progress::SessionProgress;
pub use service::{QuizSession, SubmissionRecord, SubmissionResult};
pub use workflow::{QuizEngine, SessionStart, SessionWarning};
