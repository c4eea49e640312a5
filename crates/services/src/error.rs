//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::AnswerId;
use storage::repository::StorageError;

/// Errors emitted by session services.
///
/// Only invalid operations and explicit persistence retries surface here;
/// degraded reads and absorbed write failures are logged instead (see the
/// workflow layer).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session is already terminated")]
    Terminated,

    #[error("session is still in progress")]
    NotTerminated,

    #[error("a submission is already being processed")]
    SubmissionInFlight,

    #[error("no question is currently active")]
    NoCurrentQuestion,

    #[error("option {0} is not part of the current question")]
    UnknownOption(AnswerId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
