use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::ProgressRepository;
use study_core::Clock;
use study_core::model::QuestionBank;

use super::flow::{ExamFlow, ExamSetup};
use super::generator::{ExamGenerator, RandomPermutation};
use super::session::{AnswerFeedback, ExamSession};
use crate::config::ExamConfig;
use crate::error::{ExamError, FlowError};
use crate::progress::SessionCompletion;

/// Result of finalizing one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub feedback: AnswerFeedback,
    pub is_complete: bool,
    /// Set on the answer that finished the exam.
    pub completion: Option<SessionCompletion>,
}

/// Orchestrates exam start, answering and progress persistence.
pub struct ExamLoopService {
    clock: Clock,
    config: ExamConfig,
    progress: Arc<dyn ProgressRepository>,
    rng: Mutex<StdRng>,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            config: ExamConfig::default(),
            progress,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Make question selection reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ExamConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    /// Generate an exam for `setup` and start its quiz.
    ///
    /// The persisted progress is read here, once per session.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NoQuestions` if the selection yields no questions, or
    /// `ExamError::Storage` if progress cannot be read.
    pub async fn start_exam(
        &self,
        bank: &QuestionBank,
        setup: &ExamSetup,
    ) -> Result<ExamSession, ExamError> {
        let baseline = self.progress.load_progress().await?;

        let plan = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            ExamGenerator::new(bank).generate(
                setup.count().get(),
                &setup.module_list(),
                &mut RandomPermutation::new(&mut *rng),
            )
        };
        log::info!(
            "starting exam: {} of {} questions ({} hard, {} medium, {} easy)",
            plan.total(),
            setup.count(),
            plan.hard_selected,
            plan.medium_selected,
            plan.easy_selected
        );

        ExamSession::new(
            plan.questions,
            baseline,
            self.clock.now(),
            self.config.seconds_per_question,
        )
    }

    /// Answer the current question and persist progress when it was the last one.
    ///
    /// # Errors
    ///
    /// Returns the session's answer errors, or `ExamError::Storage` if the final save
    /// fails. In that case the session keeps its completion and `finalize` can retry.
    pub async fn answer_current(
        &self,
        session: &mut ExamSession,
        choice: usize,
    ) -> Result<AnswerOutcome, ExamError> {
        let feedback = session.answer_current(choice, self.clock.now())?;
        self.settle(session, feedback).await
    }

    /// Let the countdown run for `secs`; a timeout is handled like a wrong answer.
    ///
    /// # Errors
    ///
    /// Same as [`Self::answer_current`].
    pub async fn tick(
        &self,
        session: &mut ExamSession,
        secs: u32,
    ) -> Result<Option<AnswerOutcome>, ExamError> {
        match session.tick(secs, self.clock.now())? {
            Some(feedback) => self.settle(session, feedback).await.map(Some),
            None => Ok(None),
        }
    }

    /// Persist a completed session whose earlier save failed.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Unfinished` for an open session, or `ExamError::Storage`.
    pub async fn finalize(&self, session: &mut ExamSession) -> Result<SessionCompletion, ExamError> {
        let completion = session.complete()?.clone();
        if !session.is_persisted() {
            self.persist(session, &completion).await?;
        }
        Ok(completion)
    }

    /// Retry saving the exam shown on the results screen. No-op once it is saved.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::WrongPhase` outside the results phase, or
    /// `FlowError::Exam` wrapping the storage error if the write fails again.
    pub async fn save_results(&self, flow: &mut ExamFlow) -> Result<(), FlowError> {
        let (session, report) = flow.results_mut()?;
        self.finalize(session).await?;
        report.persisted = true;
        Ok(())
    }

    async fn settle(
        &self,
        session: &mut ExamSession,
        feedback: AnswerFeedback,
    ) -> Result<AnswerOutcome, ExamError> {
        if !session.is_complete() {
            return Ok(AnswerOutcome {
                feedback,
                is_complete: false,
                completion: None,
            });
        }

        let completion = session.complete()?.clone();
        self.persist(session, &completion).await?;
        Ok(AnswerOutcome {
            feedback,
            is_complete: true,
            completion: Some(completion),
        })
    }

    async fn persist(
        &self,
        session: &mut ExamSession,
        completion: &SessionCompletion,
    ) -> Result<(), ExamError> {
        self.progress.save_progress(&completion.progress).await?;
        session.mark_persisted();
        log::info!(
            "exam completed: {}/{} correct, {} points, new badges: {:?}",
            completion.result.correct_count(),
            completion.result.question_count(),
            completion.result.points_earned(),
            completion.new_badges
        );
        Ok(())
    }
}
