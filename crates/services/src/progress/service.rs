use std::sync::Arc;

use storage::repository::ProgressRepository;
use study_core::model::StudyProgress;

use crate::error::ProgressServiceError;

/// Read access to the persisted study progress, plus an explicit reset.
#[derive(Clone)]
pub struct ProgressService {
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self { repo }
    }

    /// Current progress; zeroed if nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the backend cannot be read.
    pub async fn snapshot(&self) -> Result<StudyProgress, ProgressServiceError> {
        Ok(self.repo.load_progress().await?)
    }

    /// Overwrite the stored progress with a zeroed record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the write fails.
    pub async fn reset(&self) -> Result<StudyProgress, ProgressServiceError> {
        let fresh = StudyProgress::new();
        self.repo.save_progress(&fresh).await?;
        log::info!("study progress reset");
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::Storage;
    use study_core::model::{ExamResult, SessionStreak};
    use study_core::time::fixed_now;

    #[tokio::test]
    async fn snapshot_of_empty_store_is_zeroed() {
        let svc = ProgressService::new(Storage::in_memory().progress);
        let snapshot = svc.snapshot().await.unwrap();
        assert_eq!(snapshot.points(), 0);
        assert!(snapshot.exam_history().is_empty());
        assert_eq!(snapshot.last_exam_date(), None);
    }

    #[tokio::test]
    async fn reset_clears_stored_progress() {
        let storage = Storage::in_memory();
        let result = ExamResult::new(fixed_now(), 5, 4, 40).unwrap();
        let played = StudyProgress::new()
            .record_exam(
                &result,
                SessionStreak {
                    final_streak: 4,
                    peak_streak: 4,
                },
            )
            .progress;
        storage.progress.save_progress(&played).await.unwrap();

        let svc = ProgressService::new(Arc::clone(&storage.progress));
        assert_eq!(svc.snapshot().await.unwrap().points(), 40);

        svc.reset().await.unwrap();
        assert_eq!(svc.snapshot().await.unwrap(), StudyProgress::default());
    }
}
