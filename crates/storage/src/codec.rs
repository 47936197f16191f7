//! JSON layout of the persisted progress record.
//!
//! The document is the camelCase `StudyProgress` shape with an added
//! `schemaVersion`. Records written before versioning existed have no tag and are
//! read as version 0; the field layout is the same.

use serde::{Deserialize, Serialize};
use study_core::model::StudyProgress;

use crate::repository::StorageError;

/// Fixed storage key of the single progress record.
pub const PROGRESS_KEY: &str = "money-banking-study-progress";

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressDocument {
    #[serde(default)]
    schema_version: u32,
    #[serde(flatten)]
    progress: StudyProgress,
}

/// Serialize progress into the persisted JSON document.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_progress(progress: &StudyProgress) -> Result<String, StorageError> {
    let doc = ProgressDocument {
        schema_version: SCHEMA_VERSION,
        progress: progress.clone(),
    };
    serde_json::to_string(&doc).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Parse a persisted progress document.
///
/// Fields missing from the document take their zero defaults. A document tagged
/// with a newer schema is still read field by field.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the document is not valid JSON or a
/// present field has the wrong shape.
pub fn decode_progress(raw: &str) -> Result<StudyProgress, StorageError> {
    let doc: ProgressDocument =
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))?;
    if doc.schema_version > SCHEMA_VERSION {
        log::warn!(
            "progress document has schema version {} (newer than {SCHEMA_VERSION}); reading known fields only",
            doc.schema_version
        );
    }
    Ok(doc.progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{Badge, ExamResult, SessionStreak};
    use study_core::time::fixed_now;

    fn sample() -> StudyProgress {
        let result = ExamResult::new(fixed_now(), 5, 5, 50).unwrap();
        StudyProgress::new()
            .record_exam(
                &result,
                SessionStreak {
                    final_streak: 5,
                    peak_streak: 5,
                },
            )
            .progress
    }

    #[test]
    fn encoded_document_carries_schema_version() {
        let raw = encode_progress(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["points"], 50);
        assert_eq!(value["totalQuestions"], 5);
    }

    #[test]
    fn roundtrip_is_deep_equal() {
        let progress = sample();
        let decoded = decode_progress(&encode_progress(&progress).unwrap()).unwrap();
        assert_eq!(decoded, progress);
        assert!(decoded.has_badge(Badge::PerfectScore));
    }

    #[test]
    fn untagged_legacy_document_is_read() {
        let raw = r#"{
            "totalQuestions": 10,
            "correctAnswers": 7,
            "points": 70,
            "currentStreak": 2,
            "bestStreak": 4,
            "badges": ["first-exam"],
            "examHistory": [],
            "lastExamDate": "2023-11-14T22:13:20Z"
        }"#;
        let progress = decode_progress(raw).unwrap();
        assert_eq!(progress.correct_answers(), 7);
        assert_eq!(progress.best_streak(), 4);
        assert!(progress.has_badge(Badge::FirstExam));
        assert_eq!(progress.last_exam_date(), Some(fixed_now()));
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        let err = decode_progress("{not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn newer_document_keeps_totals_despite_unknown_parts() {
        let raw = r#"{
            "schemaVersion": 2,
            "totalQuestions": 30,
            "correctAnswers": 25,
            "points": 300,
            "badges": ["first-exam", "streak-20"],
            "examHistory": [
                {"date":"2023-11-14T22:13:20Z","questionCount":5,"correctCount":6,"pointsEarned":60}
            ],
            "studyMinutes": 42
        }"#;
        let progress = decode_progress(raw).unwrap();
        assert_eq!(progress.points(), 300);
        assert_eq!(progress.total_questions(), 30);
        assert!(progress.has_badge(Badge::FirstExam));
        assert!(progress.exam_history().is_empty());

        let rewritten = encode_progress(&progress).unwrap();
        assert!(rewritten.contains("\"streak-20\""));
    }
}
