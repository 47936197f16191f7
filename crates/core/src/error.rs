use thiserror::Error;

use crate::finance::CalcError;
use crate::model::{ExamResultError, QuestionBankError, QuestionError};

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuestionBank(#[from] QuestionBankError),
    #[error(transparent)]
    ExamResult(#[from] ExamResultError),
    #[error(transparent)]
    Calc(#[from] CalcError),
}
