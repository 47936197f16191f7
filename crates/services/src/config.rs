use study_core::model::QuestionCount;

/// Seconds allowed per question unless configured otherwise.
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 60;

/// Tunables for exam sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamConfig {
    /// Countdown per question; 0 disables the countdown.
    pub seconds_per_question: u32,
    /// Question count preselected on the setup screen.
    pub default_count: QuestionCount,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            default_count: QuestionCount::default(),
        }
    }
}

impl ExamConfig {
    #[must_use]
    pub fn with_seconds_per_question(mut self, secs: u32) -> Self {
        self.seconds_per_question = secs;
        self
    }
}
