//! crates/lesson_planner_core/src/store.rs
//!
//! Whole-collection persistence for Students and Lessons on top of a
//! `KeyValueStore`, plus the backup document used for export and import.

use crate::domain::{SavedLesson, Student};
use crate::ports::{KeyValueStore, PortError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Slot holding the serialized Students collection.
pub const STUDENTS_KEY: &str = "linguaGenStudents";
/// Slot holding the serialized Lessons collection.
pub const LESSONS_KEY: &str = "linguaGenLessons";
pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage quota exceeded. Please delete old lessons. ({0})")]
    StorageQuotaExceeded(String),
    #[error("Invalid backup file format: {0}")]
    InvalidBackupFormat(String),
    #[error("Failed to serialize collection: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Port(PortError),
}

impl From<PortError> for StoreError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::QuotaExceeded(detail) => StoreError::StorageQuotaExceeded(detail),
            other => StoreError::Port(other),
        }
    }
}

/// The portable backup document: `{version, timestamp, students, lessons}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupFile {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub students: Vec<Student>,
    pub lessons: Vec<SavedLesson>,
}

impl BackupFile {
    pub fn to_pretty_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Download name for a backup taken on `date`.
    pub fn file_name(date: NaiveDate) -> String {
        format!("linguagen-backup-{}.json", date.format("%Y-%m-%d"))
    }
}

/// Collections recovered from a backup, ready to replace the current ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedData {
    pub students: Vec<Student>,
    pub lessons: Vec<SavedLesson>,
}

/// Loads and saves whole collections. Never merges.
#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KeyValueStore>,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Returns the persisted students, or an empty list when the slot is
    /// missing or cannot be parsed.
    pub async fn load_students(&self) -> Vec<Student> {
        self.load_collection(STUDENTS_KEY).await
    }

    /// Returns the persisted lessons, or an empty list when the slot is
    /// missing or cannot be parsed.
    pub async fn load_lessons(&self) -> Vec<SavedLesson> {
        self.load_collection(LESSONS_KEY).await
    }

    pub async fn save_students(&self, students: &[Student]) -> Result<(), StoreError> {
        self.save_collection(STUDENTS_KEY, students).await
    }

    pub async fn save_lessons(&self, lessons: &[SavedLesson]) -> Result<(), StoreError> {
        self.save_collection(LESSONS_KEY, lessons).await
    }

    /// Removes both collection slots.
    pub async fn clear_all_data(&self) -> Result<(), StoreError> {
        self.kv.remove(LESSONS_KEY).await?;
        self.kv.remove(STUDENTS_KEY).await?;
        info!("Cleared all persisted students and lessons.");
        Ok(())
    }

    async fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!(key, error = %e, "Failed to read collection; starting empty.");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => {
                debug!(key, count = items.len(), "Loaded collection.");
                items
            }
            Err(e) => {
                error!(key, error = %e, "Failed to parse collection; discarding it.");
                Vec::new()
            }
        }
    }

    async fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)?;
        if let Err(e) = self.kv.set(key, &raw).await {
            error!(key, error = %e, "Failed to save collection.");
            return Err(e.into());
        }
        debug!(key, count = items.len(), bytes = raw.len(), "Saved collection.");
        Ok(())
    }
}

/// Builds the backup document for the given collections, stamped now.
pub fn export_data(lessons: &[SavedLesson], students: &[Student]) -> BackupFile {
    BackupFile {
        version: BACKUP_VERSION,
        timestamp: Utc::now(),
        students: students.to_vec(),
        lessons: lessons.to_vec(),
    }
}

/// Parses a backup document. Only the top-level shape is checked: `students`
/// and `lessons` must both be arrays.
pub fn import_data(text: &str) -> Result<ImportedData, StoreError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| StoreError::InvalidBackupFormat(e.to_string()))?;

    let students = value.get("students").filter(|v| v.is_array());
    let lessons = value.get("lessons").filter(|v| v.is_array());
    let (Some(students), Some(lessons)) = (students, lessons) else {
        return Err(StoreError::InvalidBackupFormat(
            "`students` and `lessons` must both be arrays".to_string(),
        ));
    };

    let students: Vec<Student> = serde_json::from_value(students.clone())
        .map_err(|e| StoreError::InvalidBackupFormat(format!("students: {e}")))?;
    let lessons: Vec<SavedLesson> = serde_json::from_value(lessons.clone())
        .map_err(|e| StoreError::InvalidBackupFormat(format!("lessons: {e}")))?;

    Ok(ImportedData { students, lessons })
}
