use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng, rng};

use study_core::model::{Difficulty, ExamQuestion, ModuleId, QuestionBank};

//
// ─── PERMUTATION ───────────────────────────────────────────────────────────────
//

/// Reorders a slice in place. Production code uses [`RandomPermutation`]; tests can
/// plug in a fixed ordering.
pub trait Permute {
    fn permute<T>(&mut self, items: &mut [T]);
}

impl<P: Permute> Permute for &mut P {
    fn permute<T>(&mut self, items: &mut [T]) {
        (**self).permute(items);
    }
}

/// Uniform Fisher-Yates shuffle driven by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomPermutation<R> {
    rng: R,
}

impl<R: Rng> RandomPermutation<R> {
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomPermutation<ThreadRng> {
    /// Permutation backed by the thread-local generator.
    #[must_use]
    pub fn thread() -> Self {
        Self::new(rng())
    }
}

impl RandomPermutation<StdRng> {
    /// Reproducible permutation for a given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Permute for RandomPermutation<R> {
    fn permute<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

//
// ─── DIFFICULTY QUOTA ──────────────────────────────────────────────────────────
//

/// Target composition of an exam: 40% hard, 40% medium, remainder easy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyQuota {
    pub hard: usize,
    pub medium: usize,
    pub easy: usize,
}

impl DifficultyQuota {
    /// Split `count` so that the three parts always sum to `count`.
    #[must_use]
    pub fn for_count(count: usize) -> Self {
        let hard = two_fifths_rounded(count);
        let medium = two_fifths_rounded(count);
        let easy = count.saturating_sub(hard + medium);
        Self { hard, medium, easy }
    }

    #[must_use]
    pub fn get(&self, difficulty: Difficulty) -> usize {
        match difficulty {
            Difficulty::Hard => self.hard,
            Difficulty::Medium => self.medium,
            Difficulty::Easy => self.easy,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.hard + self.medium + self.easy
    }
}

/// `round(count * 0.4)` in integer arithmetic. 2n/5 never lands on a .5 boundary.
fn two_fifths_rounded(count: usize) -> usize {
    let (whole, rest) = (count / 5, count % 5);
    whole * 2 + (rest * 4 + 5) / 10
}

//
// ─── GENERATOR ─────────────────────────────────────────────────────────────────
//

/// Questions picked for one exam, with the per-difficulty breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamPlan {
    pub questions: Vec<ExamQuestion>,
    pub quota: DifficultyQuota,
    pub hard_selected: usize,
    pub medium_selected: usize,
    pub easy_selected: usize,
}

impl ExamPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// True when the pool could not fill the requested quota.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.questions.len() < self.quota.total()
    }
}

/// Samples difficulty-balanced exams from a question bank.
pub struct ExamGenerator<'a> {
    bank: &'a QuestionBank,
}

impl<'a> ExamGenerator<'a> {
    #[must_use]
    pub fn new(bank: &'a QuestionBank) -> Self {
        Self { bank }
    }

    /// Build an exam of up to `count` questions from `modules` (all modules when empty).
    ///
    /// Each difficulty pool is permuted and cut to its quota, then the combined list is
    /// permuted once more. A thin pool yields a shorter exam rather than an error.
    pub fn generate<P: Permute>(
        &self,
        count: usize,
        modules: &[ModuleId],
        permuter: &mut P,
    ) -> ExamPlan {
        let quota = DifficultyQuota::for_count(count);
        let in_scope = |q: &&ExamQuestion| modules.is_empty() || modules.contains(&q.module_id());

        let mut picked: Vec<&ExamQuestion> = Vec::with_capacity(count.min(self.bank.len()));
        let mut selected = [0_usize; 3];

        for (slot, difficulty) in [Difficulty::Hard, Difficulty::Medium, Difficulty::Easy]
            .into_iter()
            .enumerate()
        {
            let mut pool: Vec<&ExamQuestion> = self
                .bank
                .questions()
                .iter()
                .filter(in_scope)
                .filter(|q| q.difficulty() == difficulty)
                .collect();
            permuter.permute(&mut pool);

            let wanted = quota.get(difficulty);
            if pool.len() < wanted {
                log::debug!(
                    "only {} {difficulty} questions available, wanted {wanted}",
                    pool.len()
                );
            }
            pool.truncate(wanted);
            selected[slot] = pool.len();
            picked.extend(pool);
        }

        permuter.permute(&mut picked);

        ExamPlan {
            questions: picked.into_iter().cloned().collect(),
            quota,
            hard_selected: selected[0],
            medium_selected: selected[1],
            easy_selected: selected[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{KeepOrder, bank_with, question};
    use std::collections::HashSet;
    use study_core::model::QuestionId;

    fn balanced_bank() -> QuestionBank {
        let mut questions = Vec::new();
        for module in 1..=2_u32 {
            for (tag, difficulty) in [
                ("h", Difficulty::Hard),
                ("m", Difficulty::Medium),
                ("e", Difficulty::Easy),
            ] {
                for n in 0..3 {
                    questions.push(question(&format!("m{module}-{tag}{n}"), module, difficulty));
                }
            }
        }
        bank_with(questions)
    }

    fn ids(plan: &ExamPlan) -> Vec<&str> {
        plan.questions.iter().map(|q| q.id().as_str()).collect()
    }

    #[test]
    fn quota_sums_to_count() {
        for count in 0..=40 {
            let quota = DifficultyQuota::for_count(count);
            assert_eq!(quota.total(), count, "count {count}");
            assert_eq!(quota.hard, quota.medium);
        }
    }

    #[test]
    fn quota_matches_offered_counts() {
        assert_eq!(
            DifficultyQuota::for_count(5),
            DifficultyQuota {
                hard: 2,
                medium: 2,
                easy: 1
            }
        );
        assert_eq!(DifficultyQuota::for_count(10).easy, 2);
        assert_eq!(
            DifficultyQuota::for_count(15),
            DifficultyQuota {
                hard: 6,
                medium: 6,
                easy: 3
            }
        );
        assert_eq!(DifficultyQuota::for_count(20).hard, 8);
        assert_eq!(
            DifficultyQuota::for_count(3),
            DifficultyQuota {
                hard: 1,
                medium: 1,
                easy: 1
            }
        );
    }

    #[test]
    fn five_from_one_module_is_two_two_one() {
        let bank = balanced_bank();
        let plan = ExamGenerator::new(&bank).generate(
            5,
            &[ModuleId::new(1)],
            &mut RandomPermutation::seeded(7),
        );

        assert_eq!(plan.total(), 5);
        assert_eq!(plan.hard_selected, 2);
        assert_eq!(plan.medium_selected, 2);
        assert_eq!(plan.easy_selected, 1);
        let count = |d: Difficulty| plan.questions.iter().filter(|q| q.difficulty() == d).count();
        assert_eq!(count(Difficulty::Hard), 2);
        assert_eq!(count(Difficulty::Medium), 2);
        assert_eq!(count(Difficulty::Easy), 1);
        assert!(plan.questions.iter().all(|q| q.module_id() == ModuleId::new(1)));
    }

    #[test]
    fn ample_pool_fills_forty_forty_twenty() {
        let mut questions = Vec::new();
        for (tag, difficulty) in [
            ("h", Difficulty::Hard),
            ("m", Difficulty::Medium),
            ("e", Difficulty::Easy),
        ] {
            for n in 0..20 {
                questions.push(question(&format!("{tag}{n}"), 1, difficulty));
            }
        }
        let bank = bank_with(questions);

        for (count, hard, medium, easy) in [(10, 4, 4, 2), (15, 6, 6, 3), (20, 8, 8, 4)] {
            for seed in 0..5 {
                let plan = ExamGenerator::new(&bank).generate(
                    count,
                    &[],
                    &mut RandomPermutation::seeded(seed),
                );
                let tally =
                    |d: Difficulty| plan.questions.iter().filter(|q| q.difficulty() == d).count();
                assert_eq!(plan.total(), count);
                assert_eq!(tally(Difficulty::Hard), hard);
                assert_eq!(tally(Difficulty::Medium), medium);
                assert_eq!(tally(Difficulty::Easy), easy);
                assert!(!plan.is_short());
            }
        }
    }

    #[test]
    fn no_duplicates_and_bounded_length() {
        let bank = balanced_bank();
        for seed in 0..50 {
            for count in [5, 10, 15, 20] {
                let plan = ExamGenerator::new(&bank).generate(
                    count,
                    &[],
                    &mut RandomPermutation::seeded(seed),
                );
                let unique: HashSet<&QuestionId> = plan.questions.iter().map(|q| q.id()).collect();
                assert_eq!(unique.len(), plan.total());
                assert!(plan.total() <= count);
            }
        }
    }

    #[test]
    fn thin_pool_yields_shorter_exam() {
        let bank = balanced_bank();
        let plan = ExamGenerator::new(&bank).generate(
            20,
            &[ModuleId::new(2)],
            &mut RandomPermutation::seeded(1),
        );
        // Module 2 has 3 of each difficulty: quota 8/8/4 caps at 3/3/3.
        assert_eq!(plan.total(), 9);
        assert!(plan.is_short());
        assert_eq!(plan.easy_selected, 3);
    }

    #[test]
    fn unknown_module_yields_empty_exam() {
        let bank = balanced_bank();
        let plan =
            ExamGenerator::new(&bank).generate(10, &[ModuleId::new(99)], &mut KeepOrder);
        assert!(plan.is_empty());
    }

    #[test]
    fn zero_count_is_empty() {
        let bank = balanced_bank();
        let plan = ExamGenerator::new(&bank).generate(0, &[], &mut RandomPermutation::thread());
        assert!(plan.is_empty());
        assert!(!plan.is_short());
    }

    #[test]
    fn identity_permutation_gives_hard_medium_easy_order() {
        let bank = balanced_bank();
        let plan = ExamGenerator::new(&bank).generate(5, &[ModuleId::new(1)], &mut KeepOrder);
        assert_eq!(ids(&plan), vec!["m1-h0", "m1-h1", "m1-m0", "m1-m1", "m1-e0"]);
    }

    #[test]
    fn same_seed_same_exam() {
        let bank = balanced_bank();
        let generator = ExamGenerator::new(&bank);
        let a = generator.generate(10, &[], &mut RandomPermutation::seeded(42));
        let b = generator.generate(10, &[], &mut RandomPermutation::seeded(42));
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn generation_does_not_touch_the_bank() {
        let bank = balanced_bank();
        let before = bank.clone();
        let _ = ExamGenerator::new(&bank).generate(10, &[], &mut RandomPermutation::seeded(3));
        assert_eq!(bank, before);
    }
}
