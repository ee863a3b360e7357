pub mod domain;
pub mod edit;
pub mod library;
pub mod memory;
pub mod ports;
pub mod store;
pub mod workflow;

pub use domain::{
    BilingualItem, ChatRole, ChatTurn, LessonDocument, LessonId, RefinedLesson, SavedLesson,
    SkillRating, Student, StudentId, StudentProfile, StudentSkills,
};
pub use edit::{apply_edit, EditError, LessonEdit};
pub use library::{Library, LibraryError, Outcome};
pub use ports::{
    Confirmation, KeyValueStore, LessonGenerator, PortError, PortResult, Preconfirmed,
};
pub use store::{BackupFile, ImportedData, RecordStore, StoreError};
pub use workflow::{AfterCancel, Completion, LessonWorkflow, Step, WorkflowError};
