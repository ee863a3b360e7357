//! services/planner/src/error.rs
//!
//! Defines the primary error type for the planner service.

use crate::config::ConfigError;
use lesson_planner_core::{
    library::LibraryError, ports::PortError, store::StoreError, workflow::WorkflowError,
};

/// The primary error type for the `planner` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents a standard Input/Output error (e.g., reading a backup file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad command-line input, such as a malformed edit path.
    #[error("{0}")]
    Usage(String),
}
