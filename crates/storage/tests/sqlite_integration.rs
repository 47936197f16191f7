use std::sync::Arc;

use storage::codec::PROGRESS_KEY;
use storage::repository::{KeyValueStore, ProgressRepository, Storage};
use storage::sqlite::SqliteRepository;
use study_core::model::{Badge, ExamResult, SessionStreak, StudyProgress};
use study_core::time::fixed_now;

fn progress_after_perfect_exam() -> StudyProgress {
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

#[tokio::test]
async fn sqlite_roundtrip_persists_progress() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");

    assert_eq!(
        storage.progress.load_progress().await.unwrap(),
        StudyProgress::default()
    );

    let progress = progress_after_perfect_exam();
    storage.progress.save_progress(&progress).await.unwrap();

    let loaded = storage.progress.load_progress().await.unwrap();
    assert_eq!(loaded, progress);
    assert!(loaded.has_badge(Badge::FirstExam));
}

#[tokio::test]
async fn sqlite_put_overwrites_existing_key() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Running migrations twice must be harmless.
    repo.migrate().await.expect("migrate again");

    repo.put("greeting", "hello").await.unwrap();
    repo.put("greeting", "bonjour").await.unwrap();

    assert_eq!(repo.get("greeting").await.unwrap().as_deref(), Some("bonjour"));
    assert_eq!(repo.get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_corrupt_progress_falls_back_to_defaults() {
    let repo = SqliteRepository::open("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("open");
    repo.put(PROGRESS_KEY, "{\"points\": \"lots\"}").await.unwrap();

    let storage = Storage::over_store(Arc::new(repo));
    let loaded = storage.progress.load_progress().await.unwrap();
    assert_eq!(loaded, StudyProgress::default());
}
