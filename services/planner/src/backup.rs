//! services/planner/src/backup.rs
//!
//! Backup files on disk: writing the dated export and restoring from one.

use crate::error::AppError;
use chrono::{NaiveDate, Utc};
use lesson_planner_core::{
    library::{Library, Outcome},
    ports::Confirmation,
    store::{export_data, import_data, BackupFile, ImportedData},
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Summary of a written backup.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub students: usize,
    pub lessons: usize,
}

/// Writes the whole library to `dir/linguagen-backup-<date>.json`.
pub async fn export_to_dir(
    library: &Library,
    dir: &Path,
    date: NaiveDate,
) -> Result<ExportSummary, AppError> {
    let backup = export_data(library.lessons(), library.students());
    let path = dir.join(BackupFile::file_name(date));

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, backup.to_pretty_json()?).await?;

    info!(path = %path.display(), "Backup written.");
    Ok(ExportSummary {
        path,
        students: backup.students.len(),
        lessons: backup.lessons.len(),
    })
}

/// Same as [`export_to_dir`] dated today.
pub async fn export_today(library: &Library, dir: &Path) -> Result<ExportSummary, AppError> {
    export_to_dir(library, dir, Utc::now().date_naive()).await
}

/// Reads and validates a backup file without touching the library.
pub async fn read_backup(path: &Path) -> Result<ImportedData, AppError> {
    let text = tokio::fs::read_to_string(path).await?;
    let data = import_data(&text).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Backup file rejected.");
        e
    })?;
    Ok(data)
}

/// Validates `path` and, once confirmed, replaces both collections with its contents.
/// An invalid file leaves the library untouched.
pub async fn restore_from_file(
    library: &mut Library,
    path: &Path,
    confirm: &dyn Confirmation,
) -> Result<Outcome, AppError> {
    let data = read_backup(path).await?;
    Ok(library.replace_all(data, confirm).await?)
}
