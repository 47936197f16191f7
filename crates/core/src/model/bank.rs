use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{ModuleId, QuestionId};
use crate::model::question::{Difficulty, ExamQuestion};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),

    #[error("duplicate module id: {0}")]
    DuplicateModule(ModuleId),
}

/// A course module as listed in the static module table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: ModuleId,
    pub title: String,
}

impl CourseModule {
    #[must_use]
    pub fn new(id: ModuleId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// Read-only collection of exam questions and the modules they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    modules: Vec<CourseModule>,
    questions: Vec<ExamQuestion>,
}

impl QuestionBank {
    /// Build a bank, rejecting duplicate question or module ids.
    ///
    /// Questions may reference modules missing from `modules`; the module list is only
    /// used for display and default selections.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError` on the first duplicate id found.
    pub fn new(
        modules: Vec<CourseModule>,
        questions: Vec<ExamQuestion>,
    ) -> Result<Self, QuestionBankError> {
        let mut module_ids = HashSet::with_capacity(modules.len());
        for module in &modules {
            if !module_ids.insert(module.id) {
                return Err(QuestionBankError::DuplicateModule(module.id));
            }
        }

        let mut question_ids = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !question_ids.insert(question.id()) {
                return Err(QuestionBankError::DuplicateQuestion(question.id().clone()));
            }
        }

        Ok(Self { modules, questions })
    }

    #[must_use]
    pub fn modules(&self) -> &[CourseModule] {
        &self.modules
    }

    #[must_use]
    pub fn questions(&self) -> &[ExamQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.modules.iter().map(|m| m.id).collect()
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&CourseModule> {
        self.modules.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Number of questions of the given difficulty within a module.
    #[must_use]
    pub fn count_for(&self, module_id: ModuleId, difficulty: Difficulty) -> usize {
        self.questions
            .iter()
            .filter(|q| q.module_id() == module_id && q.difficulty() == difficulty)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::ExamQuestionDraft;

    fn question(id: &str, module: u32, difficulty: Difficulty) -> ExamQuestion {
        ExamQuestionDraft {
            id: QuestionId::new(id),
            module_id: ModuleId::new(module),
            difficulty,
            question: format!("Prompt {id}"),
            options: vec!["A".into(), "B".into()],
            correct_index: 1,
            explanation: String::new(),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let err = QuestionBank::new(
            vec![CourseModule::new(ModuleId::new(1), "Money")],
            vec![
                question("q1", 1, Difficulty::Easy),
                question("q1", 1, Difficulty::Hard),
            ],
        )
        .unwrap_err();
        assert_eq!(err, QuestionBankError::DuplicateQuestion(QuestionId::new("q1")));
    }

    #[test]
    fn rejects_duplicate_modules() {
        let err = QuestionBank::new(
            vec![
                CourseModule::new(ModuleId::new(1), "Money"),
                CourseModule::new(ModuleId::new(1), "Banks"),
            ],
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, QuestionBankError::DuplicateModule(ModuleId::new(1)));
    }

    #[test]
    fn counts_by_module_and_difficulty() {
        let bank = QuestionBank::new(
            vec![
                CourseModule::new(ModuleId::new(1), "Money"),
                CourseModule::new(ModuleId::new(2), "Banks"),
            ],
            vec![
                question("q1", 1, Difficulty::Easy),
                question("q2", 1, Difficulty::Easy),
                question("q3", 2, Difficulty::Easy),
                question("q4", 1, Difficulty::Hard),
            ],
        )
        .unwrap();

        assert_eq!(bank.len(), 4);
        assert_eq!(bank.count_for(ModuleId::new(1), Difficulty::Easy), 2);
        assert_eq!(bank.count_for(ModuleId::new(2), Difficulty::Hard), 0);
        assert_eq!(bank.module(ModuleId::new(2)).unwrap().title, "Banks");
        assert_eq!(bank.module_ids(), vec![ModuleId::new(1), ModuleId::new(2)]);
    }
}
