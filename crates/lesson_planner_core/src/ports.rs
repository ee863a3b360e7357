//! crates/lesson_planner_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like storage or LLM APIs.

use crate::domain::{ChatTurn, LessonDocument, RefinedLesson, Student};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The message a generator returns when no credential has been configured.
/// Callers look for the "API Key" substring to offer a configuration hint.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "API Key not found. Please configure it in Settings.";

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("{}", MISSING_CREDENTIAL_MESSAGE)]
    MissingCredential,
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A string-keyed store of whole-collection blobs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Overwrites the value for `key`. Fails with `QuotaExceeded` when the
    /// backing store refuses the write.
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// The external content generator. Both calls need a credential and fail fast
/// with `MissingCredential` before touching the network when it is absent.
#[async_trait]
pub trait LessonGenerator: Send + Sync {
    /// Generates a complete lesson for `student` on `topic`, given the most
    /// recent previous topics (newest first) to avoid repeating content.
    async fn generate_lesson(
        &self,
        topic: &str,
        student: &Student,
        previous_topics: &[String],
    ) -> PortResult<LessonDocument>;

    /// Returns a full replacement for `document` reflecting `instruction`.
    async fn refine_lesson(
        &self,
        document: &LessonDocument,
        instruction: &str,
        history: &[ChatTurn],
    ) -> PortResult<RefinedLesson>;
}

/// Asks the user to confirm an irreversible action.
pub trait Confirmation {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Always agrees. Used when the caller has already confirmed up front.
pub struct Preconfirmed;

impl Confirmation for Preconfirmed {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
