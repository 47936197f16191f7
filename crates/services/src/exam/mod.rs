mod flow;
mod generator;
mod session;
mod timer;
mod workflow;

// Public API of the exam subsystem.
pub use crate::error::{ExamError, FlowError};
pub use flow::{ExamFlow, ExamPhase, ExamReport, ExamSetup};
pub use generator::{DifficultyQuota, ExamGenerator, ExamPlan, Permute, RandomPermutation};
pub use session::{AnswerFeedback, AnswerState, ExamSession};
pub use timer::{QuestionTimer, TimerState};
pub use workflow::{AnswerOutcome, ExamLoopService};
