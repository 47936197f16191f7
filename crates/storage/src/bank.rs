//! Loader for the static question bank document.

use serde::Deserialize;
use std::path::Path;
use study_core::model::{CourseModule, ExamQuestion, QuestionBank};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("cannot read question bank {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed question bank: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] study_core::Error),
}

#[derive(Debug, Deserialize)]
struct BankDocument {
    #[serde(default)]
    modules: Vec<CourseModule>,
    questions: Vec<ExamQuestion>,
}

/// Parse a question bank from its JSON text.
///
/// Every question is validated while parsing; duplicate ids are rejected.
///
/// # Errors
///
/// Returns `BankLoadError::Parse` for malformed JSON or an invalid question, and
/// `BankLoadError::Invalid` for duplicate ids.
pub fn parse_question_bank(raw: &str) -> Result<QuestionBank, BankLoadError> {
    let doc: BankDocument = serde_json::from_str(raw)?;
    let bank = QuestionBank::new(doc.modules, doc.questions).map_err(study_core::Error::from)?;
    log::debug!(
        "loaded question bank: {} questions in {} modules",
        bank.len(),
        bank.modules().len()
    );
    Ok(bank)
}

/// Read and parse a question bank file.
///
/// # Errors
///
/// Returns `BankLoadError::Io` if the file cannot be read, or any error of
/// [`parse_question_bank`].
pub fn load_question_bank(path: impl AsRef<Path>) -> Result<QuestionBank, BankLoadError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| BankLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_question_bank(&raw)
}
