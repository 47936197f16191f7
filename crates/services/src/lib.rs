#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod exam;
pub mod progress;

#[cfg(test)]
mod test_support;

pub use study_core::Clock;

pub use config::ExamConfig;
pub use error::{ExamError, FlowError, ProgressServiceError};
pub use exam::{
    AnswerFeedback, AnswerOutcome, ExamFlow, ExamGenerator, ExamLoopService, ExamPhase,
    ExamReport, ExamSession, ExamSetup, RandomPermutation,
};
pub use progress::{ProgressService, SessionCompletion, SessionTally, complete_session};
