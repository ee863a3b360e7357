mod common;

use lesson_planner_core::{
    domain::{SavedLesson, StudentProfile},
    library::Library,
    ports::{KeyValueStore, PortError},
    store::{RecordStore, StoreError, LESSONS_KEY, STUDENTS_KEY},
};

#[tokio::test]
async fn slots_round_trip_and_overwrite() {
    let db = common::memory_db(None).await;
    assert_eq!(db.get(STUDENTS_KEY).await.unwrap(), None);

    db.set(STUDENTS_KEY, "[]").await.unwrap();
    db.set(STUDENTS_KEY, "[{\"name\":\"Ana\"}]").await.unwrap();
    assert_eq!(
        db.get(STUDENTS_KEY).await.unwrap().as_deref(),
        Some("[{\"name\":\"Ana\"}]")
    );

    db.remove(STUDENTS_KEY).await.unwrap();
    assert_eq!(db.get(STUDENTS_KEY).await.unwrap(), None);
    db.remove(STUDENTS_KEY).await.unwrap();
}

#[tokio::test]
async fn writes_over_the_quota_are_refused_and_leave_the_old_value() {
    let db = common::memory_db(Some(64)).await;
    db.set(LESSONS_KEY, "[]").await.unwrap();

    let big = format!("[\"{}\"]", "x".repeat(100));
    let err = db.set(LESSONS_KEY, &big).await.unwrap_err();
    assert!(matches!(err, PortError::QuotaExceeded(_)));
    assert_eq!(db.get(LESSONS_KEY).await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn quota_counts_other_slots_but_not_the_one_being_replaced() {
    let db = common::memory_db(Some(60)).await;
    db.set(STUDENTS_KEY, &"s".repeat(20)).await.unwrap();
    // 17 + 20 on the other slot, 16 + 20 here: over 60.
    assert!(db.set(LESSONS_KEY, &"l".repeat(20)).await.is_err());
    // Replacing the same slot only counts the new value.
    db.set(STUDENTS_KEY, &"s".repeat(30)).await.unwrap();
}

#[tokio::test]
async fn library_survives_a_reopen_over_sqlite() {
    let db = common::memory_db(None).await;

    let mut library = Library::open(RecordStore::new(db.clone())).await;
    let ana = library
        .create_student(StudentProfile {
            name: "Ana".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    library
        .add_lesson(SavedLesson {
            topic: "Travel".to_string(),
            student_id: ana.id.clone(),
            profile_snapshot: ana.name.clone(),
            data: common::document("Travel"),
            ..Default::default()
        })
        .await
        .unwrap();

    let reopened = Library::open(RecordStore::new(db)).await;
    assert_eq!(reopened.students(), library.students());
    assert_eq!(reopened.lessons(), library.lessons());
    assert_eq!(reopened.previous_topics(&ana.id), vec!["Travel".to_string()]);
}

#[tokio::test]
async fn corrupt_slot_loads_as_empty() {
    let db = common::memory_db(None).await;
    db.set(STUDENTS_KEY, "{not json").await.unwrap();

    let library = Library::open(RecordStore::new(db)).await;
    assert!(library.students().is_empty());
}

#[tokio::test]
async fn quota_failure_surfaces_as_storage_error_but_keeps_memory() {
    let db = common::memory_db(Some(200)).await;
    let mut library = Library::open(RecordStore::new(db.clone())).await;

    let err = library
        .create_student(StudentProfile {
            name: "A".repeat(300),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        lesson_planner_core::library::LibraryError::Store(StoreError::StorageQuotaExceeded(_))
    ));
    assert_eq!(library.students().len(), 1);
    assert_eq!(db.get(STUDENTS_KEY).await.unwrap(), None);
}
