use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{ModuleId, QuestionId};

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty tier of an exam question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id must not be empty")]
    EmptyId,

    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} needs at least 2 options, got {len}")]
    TooFewOptions { id: QuestionId, len: usize },

    #[error("question {id} has correct index {index} outside {len} options")]
    CorrectIndexOutOfRange {
        id: QuestionId,
        index: usize,
        len: usize,
    },
}

//
// ─── QUESTION DRAFT ────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in the bank document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestionDraft {
    pub id: QuestionId,
    pub module_id: ModuleId,
    pub difficulty: Difficulty,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl ExamQuestionDraft {
    /// Validate the draft into an immutable question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id or prompt is blank, fewer than two options are
    /// given, or `correct_index` does not point at an option.
    pub fn validate(self) -> Result<ExamQuestion, QuestionError> {
        if self.id.is_blank() {
            return Err(QuestionError::EmptyId);
        }
        if self.question.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id: self.id });
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                len: self.options.len(),
                id: self.id,
            });
        }
        if self.correct_index >= self.options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_index,
                len: self.options.len(),
                id: self.id,
            });
        }

        Ok(ExamQuestion {
            id: self.id,
            module_id: self.module_id,
            difficulty: self.difficulty,
            question: self.question,
            options: self.options,
            correct_index: self.correct_index,
            explanation: self.explanation,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice exam question.
///
/// `correct_index` is guaranteed to index into `options`, and there are at least two options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    id: QuestionId,
    module_id: ModuleId,
    difficulty: Difficulty,
    question: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: String,
}

impl ExamQuestion {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Returns true if `choice` is the correct option.
    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_index
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }
}

impl<'de> Deserialize<'de> for ExamQuestion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        ExamQuestionDraft::deserialize(deserializer)?
            .validate()
            .map_err(serde::de::Error::custom)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ExamQuestionDraft {
        ExamQuestionDraft {
            id: QuestionId::new("m1-q1"),
            module_id: ModuleId::new(1),
            difficulty: Difficulty::Medium,
            question: "Which asset is most liquid?".into(),
            options: vec!["Cash".into(), "Real estate".into(), "Art".into()],
            correct_index: 0,
            explanation: "Cash is the medium of exchange.".into(),
        }
    }

    #[test]
    fn valid_draft_builds_question() {
        let q = draft().validate().unwrap();
        assert_eq!(q.id().as_str(), "m1-q1");
        assert!(q.is_correct(0));
        assert!(!q.is_correct(2));
        assert_eq!(q.correct_option(), "Cash");
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        let mut d = draft();
        d.correct_index = 3;
        let err = d.validate().unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectIndexOutOfRange { index: 3, len: 3, .. }
        ));
    }

    #[test]
    fn rejects_single_option() {
        let mut d = draft();
        d.options.truncate(1);
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::TooFewOptions { len: 1, .. }
        ));
    }

    #[test]
    fn rejects_blank_id_and_prompt() {
        let mut d = draft();
        d.id = QuestionId::new(" ");
        assert_eq!(d.validate().unwrap_err(), QuestionError::EmptyId);

        let mut d = draft();
        d.question = "\n".into();
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::EmptyPrompt { .. }
        ));
    }

    #[test]
    fn deserialize_runs_validation() {
        let json = r#"{
            "id": "m2-q1",
            "moduleId": 2,
            "difficulty": "easy",
            "question": "What is M1?",
            "options": ["Currency and checkable deposits"],
            "correctIndex": 0
        }"#;
        let result = serde_json::from_str::<ExamQuestion>(json);
        assert!(result.is_err());
    }
}
