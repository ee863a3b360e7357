mod common;

use chrono::NaiveDate;
use lesson_planner_core::{
    domain::{SavedLesson, StudentProfile},
    library::{Library, Outcome},
    ports::{Confirmation, Preconfirmed},
    store::RecordStore,
};
use planner_lib::{backup, error::AppError};
use std::cell::RefCell;

struct Decline(RefCell<Vec<String>>);

impl Confirmation for Decline {
    fn confirm(&self, prompt: &str) -> bool {
        self.0.borrow_mut().push(prompt.to_string());
        false
    }
}

async fn seeded_library() -> Library {
    let db = common::memory_db(None).await;
    let mut library = Library::open(RecordStore::new(db)).await;
    let ana = library
        .create_student(StudentProfile {
            name: "Ana".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    for topic in ["Travel", "Food"] {
        library
            .add_lesson(SavedLesson {
                topic: topic.to_string(),
                student_id: ana.id.clone(),
                profile_snapshot: "Ana".to_string(),
                data: common::document(topic),
                ..Default::default()
            })
            .await
            .unwrap();
    }
    library
}

#[tokio::test]
async fn export_then_restore_into_an_empty_library() {
    let dir = tempfile::tempdir().unwrap();
    let source = seeded_library().await;

    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    let summary = backup::export_to_dir(&source, dir.path(), date).await.unwrap();
    assert_eq!(summary.path, dir.path().join("linguagen-backup-2024-03-09.json"));
    assert_eq!((summary.students, summary.lessons), (1, 2));

    let text = std::fs::read_to_string(&summary.path).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(raw["version"], 1);
    assert!(raw["timestamp"].is_string());

    let mut target = Library::open(RecordStore::new(common::memory_db(None).await)).await;
    let outcome = backup::restore_from_file(&mut target, &summary.path, &Preconfirmed)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Done);
    assert_eq!(target.students(), source.students());
    assert_eq!(target.lessons(), source.lessons());
}

#[tokio::test]
async fn declined_restore_reports_counts_and_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = seeded_library().await;
    let summary = backup::export_today(&source, dir.path()).await.unwrap();

    let mut target = Library::open(RecordStore::new(common::memory_db(None).await)).await;
    let decline = Decline(RefCell::new(Vec::new()));
    let outcome = backup::restore_from_file(&mut target, &summary.path, &decline)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Declined);
    assert!(target.students().is_empty());
    assert!(decline.0.borrow()[0].starts_with("Found 1 students and 2 lessons in backup."));
}

#[tokio::test]
async fn malformed_backup_is_rejected_and_library_is_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"students": {"a": 1}, "lessons": []}"#).unwrap();

    let mut library = seeded_library().await;
    let before = (library.students().to_vec(), library.lessons().to_vec());

    let err = backup::restore_from_file(&mut library, &path, &Preconfirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Store(_)));
    assert_eq!(library.students(), before.0.as_slice());
    assert_eq!(library.lessons(), before.1.as_slice());
}

#[tokio::test]
async fn missing_backup_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = backup::read_backup(&dir.path().join("nope.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Io(_)));
}
