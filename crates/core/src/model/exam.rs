use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Question counts offered when setting up an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum QuestionCount {
    Five,
    #[default]
    Ten,
    Fifteen,
    Twenty,
}

impl QuestionCount {
    pub const ALL: [QuestionCount; 4] = [
        QuestionCount::Five,
        QuestionCount::Ten,
        QuestionCount::Fifteen,
        QuestionCount::Twenty,
    ];

    #[must_use]
    pub fn get(self) -> usize {
        match self {
            QuestionCount::Five => 5,
            QuestionCount::Ten => 10,
            QuestionCount::Fifteen => 15,
            QuestionCount::Twenty => 20,
        }
    }
}

impl TryFrom<u32> for QuestionCount {
    type Error = ExamResultError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::Five),
            10 => Ok(Self::Ten),
            15 => Ok(Self::Fifteen),
            20 => Ok(Self::Twenty),
            other => Err(ExamResultError::UnsupportedCount(other)),
        }
    }
}

impl fmt::Display for QuestionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamResultError {
    #[error("correct count ({correct}) exceeds question count ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("unsupported question count: {0} (expected 5, 10, 15 or 20)")]
    UnsupportedCount(u32),
}

/// Outcome of one completed exam session, as kept in the progress history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawExamResult")]
pub struct ExamResult {
    date: DateTime<Utc>,
    question_count: u32,
    correct_count: u32,
    points_earned: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExamResult {
    date: DateTime<Utc>,
    question_count: u32,
    correct_count: u32,
    #[serde(default)]
    points_earned: u32,
}

impl TryFrom<RawExamResult> for ExamResult {
    type Error = ExamResultError;

    fn try_from(raw: RawExamResult) -> Result<Self, Self::Error> {
        Self::new(
            raw.date,
            raw.question_count,
            raw.correct_count,
            raw.points_earned,
        )
    }
}

impl ExamResult {
    /// # Errors
    ///
    /// Returns `ExamResultError::CorrectExceedsTotal` if `correct_count > question_count`.
    pub fn new(
        date: DateTime<Utc>,
        question_count: u32,
        correct_count: u32,
        points_earned: u32,
    ) -> Result<Self, ExamResultError> {
        if correct_count > question_count {
            return Err(ExamResultError::CorrectExceedsTotal {
                correct: correct_count,
                total: question_count,
            });
        }
        Ok(Self {
            date,
            question_count,
            correct_count,
            points_earned,
        })
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn points_earned(&self) -> u32 {
        self.points_earned
    }

    /// Share of correct answers, 0-100. Zero for an empty exam.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.question_count == 0 {
            return 0.0;
        }
        f64::from(self.correct_count) * 100.0 / f64::from(self.question_count)
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.question_count > 0 && self.correct_count == self.question_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rejects_more_correct_than_asked() {
        let err = ExamResult::new(fixed_now(), 5, 6, 60).unwrap_err();
        assert_eq!(
            err,
            ExamResultError::CorrectExceedsTotal {
                correct: 6,
                total: 5
            }
        );
    }

    #[test]
    fn percentage_and_perfect() {
        let result = ExamResult::new(fixed_now(), 4, 3, 30).unwrap();
        assert!((result.percentage() - 75.0).abs() < f64::EPSILON);
        assert!(!result.is_perfect());

        let empty = ExamResult::new(fixed_now(), 0, 0, 0).unwrap();
        assert_eq!(empty.percentage(), 0.0);
        assert!(!empty.is_perfect());
    }

    #[test]
    fn question_count_accepts_only_offered_values() {
        assert_eq!(QuestionCount::try_from(15).unwrap().get(), 15);
        assert_eq!(
            QuestionCount::try_from(7).unwrap_err(),
            ExamResultError::UnsupportedCount(7)
        );
        assert_eq!(QuestionCount::default(), QuestionCount::Ten);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let result = ExamResult::new(fixed_now(), 5, 5, 50).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["questionCount"], 5);
        assert_eq!(value["correctCount"], 5);
        assert_eq!(value["pointsEarned"], 50);
    }

    #[test]
    fn deserialize_enforces_count_invariant() {
        let json = r#"{"date":"2023-11-14T22:13:20Z","questionCount":2,"correctCount":3}"#;
        assert!(serde_json::from_str::<ExamResult>(json).is_err());
    }
}
