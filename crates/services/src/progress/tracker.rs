use chrono::{DateTime, Utc};
use study_core::model::{Badge, ExamResult, ExamResultError, SessionStreak, StudyProgress};

/// Points awarded per correct answer. No partial credit, no time bonus.
pub const POINTS_PER_CORRECT: u32 = 10;

/// Running counters of one exam session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionTally {
    correct_count: u32,
    session_streak: u32,
    peak_streak: u32,
    points_earned: u32,
}

impl SessionTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finalized answer. A timeout counts as incorrect.
    pub fn record_answer(&mut self, is_correct: bool) {
        if is_correct {
            self.correct_count += 1;
            self.session_streak += 1;
            self.points_earned += POINTS_PER_CORRECT;
            self.peak_streak = self.peak_streak.max(self.session_streak);
        } else {
            self.session_streak = 0;
        }
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn session_streak(&self) -> u32 {
        self.session_streak
    }

    #[must_use]
    pub fn peak_streak(&self) -> u32 {
        self.peak_streak
    }

    #[must_use]
    pub fn points_earned(&self) -> u32 {
        self.points_earned
    }

    #[must_use]
    pub fn streak(&self) -> SessionStreak {
        SessionStreak {
            final_streak: self.session_streak,
            peak_streak: self.peak_streak,
        }
    }
}

/// Everything produced when an exam session is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCompletion {
    pub result: ExamResult,
    pub progress: StudyProgress,
    pub new_badges: Vec<Badge>,
}

/// Fold a finished session into the progress snapshot taken when it started.
///
/// Pure: `progress` is not modified, the returned record replaces it wholesale.
///
/// # Errors
///
/// Returns `ExamResultError::CorrectExceedsTotal` if the tally counted more correct
/// answers than `question_count`.
pub fn complete_session(
    tally: &SessionTally,
    question_count: u32,
    progress: &StudyProgress,
    now: DateTime<Utc>,
) -> Result<SessionCompletion, ExamResultError> {
    let result = ExamResult::new(
        now,
        question_count,
        tally.correct_count(),
        tally.points_earned(),
    )?;
    let update = progress.record_exam(&result, tally.streak());

    Ok(SessionCompletion {
        result,
        progress: update.progress,
        new_badges: update.new_badges,
    })
}
