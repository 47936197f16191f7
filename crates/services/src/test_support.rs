//! Builders shared by the unit tests of this crate.

use std::collections::BTreeSet;

use study_core::model::{
    CourseModule, Difficulty, ExamQuestion, ExamQuestionDraft, ModuleId, QuestionBank, QuestionId,
};

use crate::exam::Permute;

/// Leaves every slice in its original order.
pub struct KeepOrder;

impl Permute for KeepOrder {
    fn permute<T>(&mut self, _items: &mut [T]) {}
}

/// Two-option question whose correct answer is option 0.
pub fn question(id: &str, module: u32, difficulty: Difficulty) -> ExamQuestion {
    ExamQuestionDraft {
        id: QuestionId::new(id),
        module_id: ModuleId::new(module),
        difficulty,
        question: format!("Prompt for {id}"),
        options: vec!["right".into(), "wrong".into()],
        correct_index: 0,
        explanation: format!("Because {id}."),
    }
    .validate()
    .unwrap()
}

pub fn bank_with(questions: Vec<ExamQuestion>) -> QuestionBank {
    let modules: BTreeSet<ModuleId> = questions.iter().map(ExamQuestion::module_id).collect();
    let modules = modules
        .into_iter()
        .map(|id| CourseModule::new(id, format!("Module {id}")))
        .collect();
    QuestionBank::new(modules, questions).unwrap()
}

/// `n` medium questions in module 1, ids `q0..q{n-1}`.
pub fn questions(n: usize) -> Vec<ExamQuestion> {
    (0..n)
        .map(|i| question(&format!("q{i}"), 1, Difficulty::Medium))
        .collect()
}
