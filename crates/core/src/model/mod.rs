mod bank;
mod exam;
mod ids;
mod progress;
mod question;

pub use ids::{ModuleId, ParseIdError, QuestionId};

pub use bank::{CourseModule, QuestionBank, QuestionBankError};
pub use exam::{ExamResult, ExamResultError, QuestionCount};
pub use progress::{Badge, EXAM_HISTORY_LIMIT, ProgressUpdate, SessionStreak, StudyProgress};
pub use question::{Difficulty, ExamQuestion, ExamQuestionDraft, QuestionError};
