//! crates/lesson_planner_core/src/library.rs
//!
//! The in-memory Students and Lessons collections and every mutation on them.
//! Each mutation updates memory first and then persists the affected
//! collections; a failed save is reported but never rolled back.

use crate::domain::{LessonId, SavedLesson, Student, StudentId, StudentProfile};
use crate::ports::Confirmation;
use crate::store::{ImportedData, RecordStore, StoreError};
use tracing::{info, warn};

/// How many earlier topics are handed to the generator as context.
pub const MAX_PREVIOUS_TOPICS: usize = 9;

pub const DELETE_STUDENT_PROMPT: &str = "Are you sure you want to delete this student? \
Associated lessons will maintain their history but be unlinked.";
pub const DELETE_LESSON_PROMPT: &str = "Are you sure you want to delete this lesson?";
pub const CLEAR_ALL_PROMPT: &str = "DANGER: This will permanently delete ALL students and lessons. \
This cannot be undone. Are you sure?";

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Student {0} not found")]
    StudentNotFound(StudentId),
    #[error("Lesson {0} not found")]
    LessonNotFound(LessonId),
    /// The in-memory change was applied but could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whether a confirmed action actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Declined,
}

pub struct Library {
    store: RecordStore,
    students: Vec<Student>,
    lessons: Vec<SavedLesson>,
}

impl Library {
    /// Loads both collections from the store.
    pub async fn open(store: RecordStore) -> Self {
        let students = store.load_students().await;
        let lessons = store.load_lessons().await;
        info!(
            students = students.len(),
            lessons = lessons.len(),
            "Library loaded."
        );
        Self {
            store,
            students,
            lessons,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn lessons(&self) -> &[SavedLesson] {
        &self.lessons
    }

    pub fn student(&self, id: &StudentId) -> Option<&Student> {
        self.students.iter().find(|s| &s.id == id)
    }

    pub fn lesson(&self, id: &LessonId) -> Option<&SavedLesson> {
        self.lessons.iter().find(|l| &l.id == id)
    }

    /// Topics of the student's lessons, newest first, at most nine.
    pub fn previous_topics(&self, student_id: &StudentId) -> Vec<String> {
        previous_topics(&self.lessons, student_id)
    }

    // --- Students ---

    /// Adds a new student with a fresh identity and creation time.
    pub async fn create_student(&mut self, profile: StudentProfile) -> Result<Student, LibraryError> {
        let student = Student::from_profile(profile);
        self.students.push(student.clone());
        info!(student_id = %student.id, "Created student.");
        self.store.save_students(&self.students).await?;
        Ok(student)
    }

    /// Replaces the profile of an existing student and re-syncs the name
    /// snapshot on every lesson that still points at it. Returns how many
    /// lessons were re-synced.
    pub async fn update_student(
        &mut self,
        id: &StudentId,
        profile: StudentProfile,
    ) -> Result<usize, LibraryError> {
        let student = self
            .students
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| LibraryError::StudentNotFound(id.clone()))?;

        *student = Student {
            id: student.id.clone(),
            created_at: student.created_at,
            ..Student::from_profile(profile)
        };
        let name = student.name.clone();

        let mut resynced = 0;
        for lesson in self.lessons.iter_mut().filter(|l| &l.student_id == id) {
            lesson.profile_snapshot = name.clone();
            resynced += 1;
        }
        info!(student_id = %id, resynced, "Updated student.");

        let students_saved = self.store.save_students(&self.students).await;
        let lessons_saved = self.store.save_lessons(&self.lessons).await;
        students_saved?;
        lessons_saved?;
        Ok(resynced)
    }

    /// Removes a student after confirmation. Lessons are left untouched.
    pub async fn delete_student(
        &mut self,
        id: &StudentId,
        confirm: &dyn Confirmation,
    ) -> Result<Outcome, LibraryError> {
        if self.student(id).is_none() {
            return Err(LibraryError::StudentNotFound(id.clone()));
        }
        if !confirm.confirm(DELETE_STUDENT_PROMPT) {
            return Ok(Outcome::Declined);
        }
        self.students.retain(|s| &s.id != id);
        info!(student_id = %id, "Deleted student; lessons keep their snapshot.");
        self.store.save_students(&self.students).await?;
        Ok(Outcome::Done)
    }

    // --- Lessons ---

    pub async fn add_lesson(&mut self, lesson: SavedLesson) -> Result<(), LibraryError> {
        info!(lesson_id = %lesson.id, topic = %lesson.topic, "Saved new lesson.");
        self.lessons.push(lesson);
        self.store.save_lessons(&self.lessons).await?;
        Ok(())
    }

    /// Replaces a lesson in place. Identity and creation time always come
    /// from the stored record.
    pub async fn update_lesson(&mut self, lesson: SavedLesson) -> Result<SavedLesson, LibraryError> {
        let slot = self
            .lessons
            .iter_mut()
            .find(|l| l.id == lesson.id)
            .ok_or_else(|| LibraryError::LessonNotFound(lesson.id.clone()))?;

        *slot = SavedLesson {
            id: slot.id.clone(),
            created_at: slot.created_at,
            ..lesson
        };
        let updated = slot.clone();
        info!(lesson_id = %updated.id, "Updated lesson.");
        self.store.save_lessons(&self.lessons).await?;
        Ok(updated)
    }

    pub async fn delete_lesson(
        &mut self,
        id: &LessonId,
        confirm: &dyn Confirmation,
    ) -> Result<Outcome, LibraryError> {
        if self.lesson(id).is_none() {
            return Err(LibraryError::LessonNotFound(id.clone()));
        }
        if !confirm.confirm(DELETE_LESSON_PROMPT) {
            return Ok(Outcome::Declined);
        }
        self.lessons.retain(|l| &l.id != id);
        info!(lesson_id = %id, "Deleted lesson.");
        self.store.save_lessons(&self.lessons).await?;
        Ok(Outcome::Done)
    }

    // --- Whole dataset ---

    /// Overwrites both collections with imported data after confirmation.
    pub async fn replace_all(
        &mut self,
        data: ImportedData,
        confirm: &dyn Confirmation,
    ) -> Result<Outcome, LibraryError> {
        let prompt = format!(
            "Found {} students and {} lessons in backup. This will OVERWRITE your current data. Continue?",
            data.students.len(),
            data.lessons.len()
        );
        if !confirm.confirm(&prompt) {
            return Ok(Outcome::Declined);
        }
        self.students = data.students;
        self.lessons = data.lessons;
        info!(
            students = self.students.len(),
            lessons = self.lessons.len(),
            "Restored data from backup."
        );
        let students_saved = self.store.save_students(&self.students).await;
        let lessons_saved = self.store.save_lessons(&self.lessons).await;
        students_saved?;
        lessons_saved?;
        Ok(Outcome::Done)
    }

    /// Wipes both collections, in memory and in the store, after confirmation.
    pub async fn clear(&mut self, confirm: &dyn Confirmation) -> Result<Outcome, LibraryError> {
        if !confirm.confirm(CLEAR_ALL_PROMPT) {
            return Ok(Outcome::Declined);
        }
        self.store.clear_all_data().await?;
        self.students.clear();
        self.lessons.clear();
        warn!("All students and lessons have been wiped.");
        Ok(Outcome::Done)
    }
}

/// Topics of `student_id`'s lessons sorted by creation time, newest first,
/// capped at `MAX_PREVIOUS_TOPICS`.
pub fn previous_topics(lessons: &[SavedLesson], student_id: &StudentId) -> Vec<String> {
    let mut own: Vec<&SavedLesson> = lessons.iter().filter(|l| &l.student_id == student_id).collect();
    own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    own.into_iter()
        .take(MAX_PREVIOUS_TOPICS)
        .map(|l| l.topic.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LessonDocument, SkillRating, StudentSkills};
    use crate::memory::MemoryStore;
    use crate::ports::Preconfirmed;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    struct Decline;

    impl Confirmation for Decline {
        fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    fn profile(name: &str) -> StudentProfile {
        StudentProfile {
            name: name.to_string(),
            interests: "tech".to_string(),
            skills: StudentSkills {
                speaking: SkillRating::new(2),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn lesson_for(student: &Student, topic: &str, minutes_after_epoch: i64) -> SavedLesson {
        SavedLesson {
            id: LessonId::new(),
            topic: topic.to_string(),
            student_id: student.id.clone(),
            profile_snapshot: student.name.clone(),
            created_at: Utc.timestamp_opt(0, 0).unwrap() + Duration::minutes(minutes_after_epoch),
            data: LessonDocument::default(),
        }
    }

    async fn library() -> Library {
        Library::open(RecordStore::new(Arc::new(MemoryStore::new()))).await
    }

    #[tokio::test]
    async fn create_assigns_identity_and_persists() {
        let mut lib = library().await;
        let ana = lib.create_student(profile("Ana")).await.unwrap();
        assert!(!ana.id.as_str().is_empty());
        assert_eq!(lib.store().load_students().await, vec![ana]);
    }

    #[tokio::test]
    async fn update_cascades_name_into_matching_snapshots_only() {
        let mut lib = library().await;
        let ana = lib.create_student(profile("Ana")).await.unwrap();
        let bruno = lib.create_student(profile("Bruno")).await.unwrap();
        lib.add_lesson(lesson_for(&ana, "Travel", 1)).await.unwrap();
        lib.add_lesson(lesson_for(&bruno, "Food", 2)).await.unwrap();
        lib.add_lesson(lesson_for(&ana, "Work", 3)).await.unwrap();

        let resynced = lib.update_student(&ana.id, profile("Ana Maria")).await.unwrap();
        assert_eq!(resynced, 2);

        let stored = lib.store().load_lessons().await;
        for lesson in &stored {
            if lesson.student_id == ana.id {
                assert_eq!(lesson.profile_snapshot, "Ana Maria");
            } else {
                assert_eq!(lesson.profile_snapshot, "Bruno");
            }
        }
        let updated = lib.student(&ana.id).unwrap();
        assert_eq!(updated.created_at, ana.created_at);
    }

    #[tokio::test]
    async fn update_of_unknown_student_fails() {
        let mut lib = library().await;
        let err = lib
            .update_student(&StudentId::from("missing"), profile("X"))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::StudentNotFound(_)));
    }

    #[tokio::test]
    async fn delete_student_keeps_lessons_and_snapshots() {
        let mut lib = library().await;
        let ana = lib.create_student(profile("Ana")).await.unwrap();
        lib.add_lesson(lesson_for(&ana, "Travel", 1)).await.unwrap();
        lib.add_lesson(lesson_for(&ana, "Food", 2)).await.unwrap();

        let outcome = lib.delete_student(&ana.id, &Preconfirmed).await.unwrap();
        assert_eq!(outcome, Outcome::Done);

        let store = lib.store();
        assert!(store.load_students().await.is_empty());
        let lessons = store.load_lessons().await;
        assert_eq!(lessons.len(), 2);
        assert!(lessons
            .iter()
            .all(|l| l.profile_snapshot == "Ana" && l.student_id == ana.id));
        assert!(lib.student(&ana.id).is_none());
    }

    #[tokio::test]
    async fn declined_deletions_change_nothing() {
        let mut lib = library().await;
        let ana = lib.create_student(profile("Ana")).await.unwrap();
        let lesson = lesson_for(&ana, "Travel", 1);
        lib.add_lesson(lesson.clone()).await.unwrap();

        assert_eq!(lib.delete_student(&ana.id, &Decline).await.unwrap(), Outcome::Declined);
        assert_eq!(lib.delete_lesson(&lesson.id, &Decline).await.unwrap(), Outcome::Declined);
        assert_eq!(lib.clear(&Decline).await.unwrap(), Outcome::Declined);
        assert_eq!(lib.students().len(), 1);
        assert_eq!(lib.lessons().len(), 1);
    }

    #[tokio::test]
    async fn update_lesson_preserves_identity_and_creation_time() {
        let mut lib = library().await;
        let ana = lib.create_student(profile("Ana")).await.unwrap();
        let original = lesson_for(&ana, "Travel", 1);
        lib.add_lesson(original.clone()).await.unwrap();

        let mut changed = original.clone();
        changed.topic = "Travel to Lisbon".to_string();
        changed.created_at = Utc::now();
        let updated = lib.update_lesson(changed).await.unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.topic, "Travel to Lisbon");
        assert_eq!(lib.lessons().len(), 1);
    }

    #[tokio::test]
    async fn quota_failure_keeps_in_memory_state() {
        let mut lib = Library::open(RecordStore::new(Arc::new(MemoryStore::with_quota(64)))).await;
        let err = lib.create_student(profile("Ana")).await.unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Store(StoreError::StorageQuotaExceeded(_))
        ));
        assert_eq!(lib.students().len(), 1);
        assert!(lib.store().load_students().await.is_empty());
    }

    #[tokio::test]
    async fn replace_all_overwrites_rather_than_merges() {
        let mut lib = library().await;
        let ana = lib.create_student(profile("Ana")).await.unwrap();
        lib.add_lesson(lesson_for(&ana, "Travel", 1)).await.unwrap();

        let bruno = Student::from_profile(profile("Bruno"));
        let data = ImportedData {
            students: vec![bruno.clone()],
            lessons: vec![],
        };
        lib.replace_all(data, &Preconfirmed).await.unwrap();

        assert_eq!(lib.students(), &[bruno.clone()]);
        assert!(lib.lessons().is_empty());
        assert_eq!(lib.store().load_students().await, vec![bruno]);
        assert!(lib.store().load_lessons().await.is_empty());
    }

    #[tokio::test]
    async fn clear_wipes_memory_and_store() {
        let mut lib = library().await;
        let ana = lib.create_student(profile("Ana")).await.unwrap();
        lib.add_lesson(lesson_for(&ana, "Travel", 1)).await.unwrap();

        lib.clear(&Preconfirmed).await.unwrap();

        assert!(lib.students().is_empty());
        assert!(lib.lessons().is_empty());
        assert!(lib.store().load_lessons().await.is_empty());
    }

    #[test]
    fn previous_topics_are_nine_most_recent_descending() {
        let ana = Student::from_profile(profile("Ana"));
        let bruno = Student::from_profile(profile("Bruno"));
        // Inserted out of order to make sure sorting, not insertion order, decides.
        let mut lessons: Vec<SavedLesson> = (1..=12)
            .rev()
            .map(|t| lesson_for(&ana, &format!("t{t}"), t))
            .collect();
        lessons.swap(0, 7);
        lessons.push(lesson_for(&bruno, "other", 100));

        let topics = previous_topics(&lessons, &ana.id);
        let expected: Vec<String> = (4..=12).rev().map(|t| format!("t{t}")).collect();
        assert_eq!(topics, expected);
    }

    #[test]
    fn previous_topics_for_new_student_is_empty() {
        let ana = Student::from_profile(profile("Ana"));
        assert!(previous_topics(&[], &ana.id).is_empty());
    }
}
