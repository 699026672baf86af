//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{NormalizeError, ScoringError, SessionError};
use storage::repository::StorageError;

/// Failures while turning PDF bytes into text.
///
/// Unrecoverable for the current upload: the user retries with a different
/// file, nothing is retried automatically.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    #[error("could not read the PDF: {0}")]
    Unreadable(String),

    #[error("extraction task was aborted")]
    TaskAborted,
}

/// Failures while producing a usable question set.
///
/// Per-record defects are dropped and logged upstream; only batch-level
/// violations reach this type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("generator output could not be decoded: {0}")]
    MalformedOutput(String),

    #[error(transparent)]
    Invalid(#[from] NormalizeError),
}

/// Errors emitted by `QuizFlowService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizFlowError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
