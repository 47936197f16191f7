//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use study_core::model::ExamResultError;

use crate::exam::ExamPhase;

/// Errors emitted while running an exam session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("no questions match the selected modules")]
    NoQuestions,
    #[error("exam already completed")]
    Completed,
    #[error("question {index} has already been answered")]
    AlreadyAnswered { index: usize },
    #[error("current question has not been answered yet")]
    NotAnswered,
    #[error("choice {choice} is not one of the {options} options")]
    InvalidChoice { choice: usize, options: usize },
    #[error("exam is not finished yet")]
    Unfinished,
    #[error(transparent)]
    Result(#[from] ExamResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ExamFlow` transitions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error("expected the {expected:?} phase, exam is in {actual:?}")]
    WrongPhase {
        expected: ExamPhase,
        actual: ExamPhase,
    },
    #[error(transparent)]
    Exam(#[from] ExamError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
