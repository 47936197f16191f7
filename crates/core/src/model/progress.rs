use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use crate::model::exam::ExamResult;

/// Number of most recent exams retained in `StudyProgress::exam_history`.
pub const EXAM_HISTORY_LIMIT: usize = 10;

//
// ─── BADGES ────────────────────────────────────────────────────────────────────
//

/// One-time achievements. Once earned, a badge is never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Badge {
    #[serde(rename = "first-exam")]
    FirstExam,
    #[serde(rename = "perfect-score")]
    PerfectScore,
    #[serde(rename = "streak-5")]
    Streak5,
    #[serde(rename = "streak-10")]
    Streak10,
}

impl Badge {
    pub const ALL: [Badge; 4] = [
        Badge::FirstExam,
        Badge::PerfectScore,
        Badge::Streak5,
        Badge::Streak10,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Badge::FirstExam => "first-exam",
            Badge::PerfectScore => "perfect-score",
            Badge::Streak5 => "streak-5",
            Badge::Streak10 => "streak-10",
        }
    }

    /// Inverse of [`Badge::id`].
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Badge::ALL.into_iter().find(|badge| badge.id() == id)
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Badge::FirstExam => "First Exam",
            Badge::PerfectScore => "Perfect Score",
            Badge::Streak5 => "On Fire (5 in a row)",
            Badge::Streak10 => "Unstoppable (10 in a row)",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Earned badges plus ids this build does not know.
///
/// Unknown ids come from records written by a newer build; they are kept and
/// written back so a round trip through an older build loses nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct BadgeSet {
    known: BTreeSet<Badge>,
    unrecognized: BTreeSet<String>,
}

impl Serialize for BadgeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.known.len() + self.unrecognized.len()))?;
        for badge in &self.known {
            seq.serialize_element(badge.id())?;
        }
        for id in &self.unrecognized {
            seq.serialize_element(id)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for BadgeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut set = BadgeSet::default();
        for id in Vec::<String>::deserialize(deserializer)? {
            match Badge::from_id(&id) {
                Some(badge) => {
                    set.known.insert(badge);
                }
                None => {
                    set.unrecognized.insert(id);
                }
            }
        }
        Ok(set)
    }
}

//
// ─── STUDY PROGRESS ────────────────────────────────────────────────────────────
//

/// Streak figures of a single finished session, fed into `StudyProgress::record_exam`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStreak {
    /// Streak at the moment the session ended (0 if the last answer was wrong).
    pub final_streak: u32,
    /// Highest streak reached at any point during the session.
    pub peak_streak: u32,
}

/// Result of merging one exam into the progress record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: StudyProgress,
    pub new_badges: Vec<Badge>,
}

/// Cross-session study record.
///
/// Totals and badges only grow; `exam_history` keeps the last
/// [`EXAM_HISTORY_LIMIT`] results, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyProgress {
    total_questions: u32,
    correct_answers: u32,
    points: u32,
    current_streak: u32,
    best_streak: u32,
    badges: BadgeSet,
    #[serde(deserialize_with = "deserialize_history")]
    exam_history: Vec<ExamResult>,
    last_exam_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryEntry {
    Valid(ExamResult),
    Invalid(IgnoredAny),
}

/// Entries that fail validation are dropped one by one; the rest of the record stays.
fn deserialize_history<'de, D>(deserializer: D) -> Result<Vec<ExamResult>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut history: Vec<ExamResult> = Vec::<HistoryEntry>::deserialize(deserializer)?
        .into_iter()
        .filter_map(|entry| match entry {
            HistoryEntry::Valid(result) => Some(result),
            HistoryEntry::Invalid(_) => None,
        })
        .collect();
    trim_history(&mut history);
    Ok(history)
}

fn trim_history(history: &mut Vec<ExamResult>) {
    let overflow = history.len().saturating_sub(EXAM_HISTORY_LIMIT);
    if overflow > 0 {
        history.drain(..overflow);
    }
}

impl StudyProgress {
    /// Zeroed progress for a learner with no completed exams.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn badges(&self) -> &BTreeSet<Badge> {
        &self.badges.known
    }

    #[must_use]
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.known.contains(&badge)
    }

    #[must_use]
    pub fn exam_history(&self) -> &[ExamResult] {
        &self.exam_history
    }

    #[must_use]
    pub fn last_exam_date(&self) -> Option<DateTime<Utc>> {
        self.last_exam_date
    }

    /// Overall share of correct answers, 0-100.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers) * 100.0 / f64::from(self.total_questions)
    }

    /// Badges a finished exam qualifies for that are not yet held.
    #[must_use]
    pub fn badges_earned_by(&self, result: &ExamResult, streak: SessionStreak) -> Vec<Badge> {
        let mut earned = Vec::new();
        let mut award = |badge: Badge, qualifies: bool| {
            if qualifies && !self.badges.known.contains(&badge) {
                earned.push(badge);
            }
        };

        award(Badge::FirstExam, self.exam_history.is_empty());
        award(Badge::PerfectScore, result.is_perfect());
        award(Badge::Streak5, streak.peak_streak >= 5);
        award(Badge::Streak10, streak.peak_streak >= 10);

        earned
    }

    /// Merge a finished exam into a new record.
    ///
    /// Every field is derived from `self` as it was before the exam; `self` is left
    /// untouched so callers can keep the prior snapshot if persisting fails.
    #[must_use]
    pub fn record_exam(&self, result: &ExamResult, streak: SessionStreak) -> ProgressUpdate {
        let new_badges = self.badges_earned_by(result, streak);

        let current_streak = if streak.final_streak > 0 {
            self.current_streak.saturating_add(streak.final_streak)
        } else {
            0
        };

        let mut badges = self.badges.clone();
        badges.known.extend(new_badges.iter().copied());

        let mut exam_history = Vec::with_capacity(self.exam_history.len() + 1);
        exam_history.extend(self.exam_history.iter().cloned());
        exam_history.push(result.clone());
        trim_history(&mut exam_history);

        let progress = StudyProgress {
            total_questions: self
                .total_questions
                .saturating_add(result.question_count()),
            correct_answers: self
                .correct_answers
                .saturating_add(result.correct_count()),
            points: self.points.saturating_add(result.points_earned()),
            current_streak,
            best_streak: self.best_streak.max(streak.final_streak),
            badges,
            exam_history,
            last_exam_date: Some(result.date()),
        };

        ProgressUpdate {
            progress,
            new_badges,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
