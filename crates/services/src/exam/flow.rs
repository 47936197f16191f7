use std::collections::BTreeSet;
use study_core::model::{Badge, ExamResult, ModuleId, QuestionBank, QuestionCount, StudyProgress};

use super::session::{AnswerState, ExamSession};
use crate::error::FlowError;

/// Screen-level phase of an exam: `Setup -> Quiz -> Results`, and back to `Setup`
/// only through `retry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    Setup,
    Quiz,
    Results,
}

/// Choices made on the setup screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExamSetup {
    count: QuestionCount,
    modules: BTreeSet<ModuleId>,
}

impl ExamSetup {
    #[must_use]
    pub fn new(count: QuestionCount, modules: impl IntoIterator<Item = ModuleId>) -> Self {
        Self {
            count,
            modules: modules.into_iter().collect(),
        }
    }

    /// Setup with every module of `bank` selected.
    #[must_use]
    pub fn for_bank(bank: &QuestionBank, count: QuestionCount) -> Self {
        Self::new(count, bank.module_ids())
    }

    #[must_use]
    pub fn count(&self) -> QuestionCount {
        self.count
    }

    /// Selected modules. Empty means the whole bank.
    #[must_use]
    pub fn modules(&self) -> &BTreeSet<ModuleId> {
        &self.modules
    }

    #[must_use]
    pub fn module_list(&self) -> Vec<ModuleId> {
        self.modules.iter().copied().collect()
    }

    /// Flip a module in or out of the selection. Returns whether it is now selected.
    pub fn toggle_module(&mut self, id: ModuleId) -> bool {
        if self.modules.remove(&id) {
            false
        } else {
            self.modules.insert(id);
            true
        }
    }
}

/// Summary shown on the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamReport {
    pub result: ExamResult,
    pub new_badges: Vec<Badge>,
    pub progress: StudyProgress,
    pub answers: Vec<AnswerState>,
    /// False if saving the progress failed; the results are still valid.
    pub persisted: bool,
}

/// The exam screen state machine.
#[derive(Debug)]
pub enum ExamFlow {
    Setup(ExamSetup),
    Quiz {
        setup: ExamSetup,
        session: ExamSession,
    },
    Results {
        setup: ExamSetup,
        report: ExamReport,
        /// Kept so a failed save can be retried from the results screen.
        session: ExamSession,
    },
}

impl ExamFlow {
    #[must_use]
    pub fn new(setup: ExamSetup) -> Self {
        Self::Setup(setup)
    }

    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        match self {
            ExamFlow::Setup(_) => ExamPhase::Setup,
            ExamFlow::Quiz { .. } => ExamPhase::Quiz,
            ExamFlow::Results { .. } => ExamPhase::Results,
        }
    }

    #[must_use]
    pub fn setup(&self) -> &ExamSetup {
        match self {
            ExamFlow::Setup(setup)
            | ExamFlow::Quiz { setup, .. }
            | ExamFlow::Results { setup, .. } => setup,
        }
    }

    /// # Errors
    ///
    /// Returns `FlowError::WrongPhase` outside the setup phase.
    pub fn setup_mut(&mut self) -> Result<&mut ExamSetup, FlowError> {
        let actual = self.phase();
        match self {
            ExamFlow::Setup(setup) => Ok(setup),
            _ => Err(FlowError::WrongPhase {
                expected: ExamPhase::Setup,
                actual,
            }),
        }
    }

    /// Enter the quiz with a freshly started session.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::WrongPhase` outside the setup phase.
    pub fn begin(&mut self, session: ExamSession) -> Result<(), FlowError> {
        let setup = self.setup_mut()?.clone();
        *self = ExamFlow::Quiz { setup, session };
        log::debug!("exam flow: setup -> quiz");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `FlowError::WrongPhase` outside the quiz phase.
    pub fn session_mut(&mut self) -> Result<&mut ExamSession, FlowError> {
        let actual = self.phase();
        match self {
            ExamFlow::Quiz { session, .. } => Ok(session),
            _ => Err(FlowError::WrongPhase {
                expected: ExamPhase::Quiz,
                actual,
            }),
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&ExamSession> {
        match self {
            ExamFlow::Quiz { session, .. } => Some(session),
            _ => None,
        }
    }

    /// Leave the quiz for the results screen.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::WrongPhase` outside the quiz phase, or `FlowError::Exam`
    /// if questions are still unanswered.
    pub fn finish(&mut self) -> Result<(), FlowError> {
        let session = self.session_mut()?;
        let completion = session.complete()?.clone();
        let report = ExamReport {
            result: completion.result,
            new_badges: completion.new_badges,
            progress: completion.progress,
            answers: session.answers().to_vec(),
            persisted: session.is_persisted(),
        };
        if let ExamFlow::Quiz { setup, session } =
            std::mem::replace(self, ExamFlow::Setup(ExamSetup::default()))
        {
            *self = ExamFlow::Results {
                setup,
                report,
                session,
            };
        }
        log::debug!("exam flow: quiz -> results");
        Ok(())
    }

    #[must_use]
    pub fn report(&self) -> Option<&ExamReport> {
        match self {
            ExamFlow::Results { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Finished session and its report.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::WrongPhase` outside the results phase.
    pub(crate) fn results_mut(&mut self) -> Result<(&mut ExamSession, &mut ExamReport), FlowError> {
        let actual = self.phase();
        match self {
            ExamFlow::Results {
                session, report, ..
            } => Ok((session, report)),
            _ => Err(FlowError::WrongPhase {
                expected: ExamPhase::Results,
                actual,
            }),
        }
    }

    /// Drop the finished session and return to setup, keeping the last selection.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::WrongPhase` outside the results phase.
    pub fn retry(&mut self) -> Result<(), FlowError> {
        let actual = self.phase();
        let ExamFlow::Results { setup, .. } = self else {
            return Err(FlowError::WrongPhase {
                expected: ExamPhase::Results,
                actual,
            });
        };
        let setup = setup.clone();
        *self = ExamFlow::Setup(setup);
        log::debug!("exam flow: results -> setup");
        Ok(())
    }
}
