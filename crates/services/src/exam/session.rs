use chrono::{DateTime, Utc};
use std::fmt;
use study_core::model::{ExamQuestion, StudyProgress};

use super::timer::QuestionTimer;
use crate::error::ExamError;
use crate::progress::{SessionCompletion, SessionTally, complete_session};

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// Per-question state. `Unanswered` moves to `Answered` once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    Unanswered,
    /// `choice` is `None` when the countdown ran out.
    Answered { choice: Option<usize>, correct: bool },
}

impl AnswerState {
    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self, AnswerState::Answered { .. })
    }
}

/// What the learner sees right after answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_index: usize,
    pub choice: Option<usize>,
    pub is_correct: bool,
    pub correct_index: usize,
    pub explanation: String,
}

impl AnswerFeedback {
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.choice.is_none()
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Quiz phase of an exam: questions are answered in order, one countdown each.
///
/// The progress snapshot is taken when the session starts and is the only input to
/// the completion merge.
pub struct ExamSession {
    questions: Vec<ExamQuestion>,
    answers: Vec<AnswerState>,
    current: usize,
    tally: SessionTally,
    timer: QuestionTimer,
    baseline: StudyProgress,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    completion: Option<SessionCompletion>,
    persisted: bool,
}

impl ExamSession {
    /// # Errors
    ///
    /// Returns `ExamError::NoQuestions` if `questions` is empty.
    pub fn new(
        questions: Vec<ExamQuestion>,
        baseline: StudyProgress,
        started_at: DateTime<Utc>,
        seconds_per_question: u32,
    ) -> Result<Self, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::NoQuestions);
        }
        Ok(Self {
            answers: vec![AnswerState::Unanswered; questions.len()],
            questions,
            current: 0,
            tally: SessionTally::new(),
            timer: QuestionTimer::start(seconds_per_question),
            baseline,
            started_at,
            completed_at: None,
            completion: None,
            persisted: false,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[ExamQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerState] {
        &self.answers
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&ExamQuestion> {
        if self.is_complete() {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    #[must_use]
    pub fn current_answer(&self) -> AnswerState {
        self.answers[self.current]
    }

    #[must_use]
    pub fn tally(&self) -> &SessionTally {
        &self.tally
    }

    #[must_use]
    pub fn timer(&self) -> &QuestionTimer {
        &self.timer
    }

    #[must_use]
    pub fn baseline(&self) -> &StudyProgress {
        &self.baseline
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// True once every question has a final answer.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn completion(&self) -> Option<&SessionCompletion> {
        self.completion.as_ref()
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Submit `choice` for the current question.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Completed` after the last answer, `AlreadyAnswered` if the
    /// current question is final, and `InvalidChoice` for an index outside the options.
    pub fn answer_current(
        &mut self,
        choice: usize,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerFeedback, ExamError> {
        self.ensure_open()?;
        let options = self.questions[self.current].options().len();
        if choice >= options {
            return Err(ExamError::InvalidChoice { choice, options });
        }
        Ok(self.finalize_current(Some(choice), answered_at))
    }

    /// Let `secs` of the countdown elapse. When it runs out, the current question is
    /// submitted as incorrect and its feedback returned.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Completed` once the exam is over.
    pub fn tick(
        &mut self,
        secs: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<AnswerFeedback>, ExamError> {
        if self.is_complete() {
            return Err(ExamError::Completed);
        }
        if self.answers[self.current].is_answered() || !self.timer.tick(secs) {
            return Ok(None);
        }
        log::debug!("question {} timed out", self.current);
        Ok(Some(self.finalize_current(None, now)))
    }

    /// Move to the next question. Returns `None` when the answered question was the last.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotAnswered` if the current question is still open.
    pub fn advance(&mut self) -> Result<Option<&ExamQuestion>, ExamError> {
        if !self.answers[self.current].is_answered() {
            return Err(ExamError::NotAnswered);
        }
        if self.current + 1 >= self.questions.len() {
            return Ok(None);
        }
        self.current += 1;
        self.timer.restart();
        Ok(self.questions.get(self.current))
    }

    /// Merge the finished session into the baseline progress, once.
    ///
    /// Later calls return the completion computed by the first.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Unfinished` while questions remain.
    pub fn complete(&mut self) -> Result<&SessionCompletion, ExamError> {
        let Some(completed_at) = self.completed_at else {
            return Err(ExamError::Unfinished);
        };
        if self.completion.is_none() {
            let question_count = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
            let completion =
                complete_session(&self.tally, question_count, &self.baseline, completed_at)?;
            self.completion = Some(completion);
        }
        self.completion.as_ref().ok_or(ExamError::Unfinished)
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    fn ensure_open(&self) -> Result<(), ExamError> {
        if self.is_complete() {
            return Err(ExamError::Completed);
        }
        if self.answers[self.current].is_answered() {
            return Err(ExamError::AlreadyAnswered {
                index: self.current,
            });
        }
        Ok(())
    }

    fn finalize_current(&mut self, choice: Option<usize>, at: DateTime<Utc>) -> AnswerFeedback {
        let question = &self.questions[self.current];
        let correct = choice.is_some_and(|c| question.is_correct(c));
        let feedback = AnswerFeedback {
            question_index: self.current,
            choice,
            is_correct: correct,
            correct_index: question.correct_index(),
            explanation: question.explanation().to_owned(),
        };

        self.answers[self.current] = AnswerState::Answered { choice, correct };
        self.tally.record_answer(correct);
        self.timer.cancel();
        if self.answers.iter().all(AnswerState::is_answered) {
            self.completed_at = Some(at);
        }
        feedback
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered", &self.answered_count())
            .field("tally", &self.tally)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}
