//! crates/lesson_planner_core/src/workflow.rs
//!
//! The two-step lesson workflow: collect a topic and a student (Input), then
//! review a draft document (Review) that can be edited in place, refined by
//! the generator, approved into the library or cancelled.
//!
//! Calls to the generator are split into `begin_*` and `complete_*` so a caller
//! can drive them from any event loop. Each `begin_*` hands out a ticket tagged
//! with the current epoch; cancelling bumps the epoch, so a response that lands
//! after the user walked away is dropped instead of resurrecting the draft.

use crate::domain::{
    ChatRole, ChatTurn, LessonDocument, LessonId, RefinedLesson, SavedLesson, Student, StudentId,
};
use crate::edit::{apply_edit, EditError, LessonEdit};
use crate::library::{Library, LibraryError};
use crate::ports::{LessonGenerator, PortResult};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Substring that marks a generator failure as a missing credential.
const MISSING_CREDENTIAL_MARKER: &str = "API Key";
const CONFIGURATION_HINT: &str = "Configure an API key (OPENAI_API_KEY or GEMINI_API_KEY) and try again.";
/// Snapshot used when the selected student disappeared before approval.
const UNKNOWN_STUDENT: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Generation { message: String },
    #[error("{message}")]
    Refinement { message: String },
    #[error("A generation or refinement request is already in progress")]
    Busy,
    #[error("This action is only available in the {expected:?} step")]
    WrongStep { expected: Step },
    #[error("The workflow has already finished")]
    Closed,
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Library(#[from] LibraryError),
}

impl WorkflowError {
    /// A pointer to configuration when the failure was a missing credential.
    pub fn configuration_hint(&self) -> Option<&'static str> {
        match self {
            WorkflowError::Generation { message } | WorkflowError::Refinement { message }
                if message.contains(MISSING_CREDENTIAL_MARKER) =>
            {
                Some(CONFIGURATION_HINT)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Input,
    Review,
}

/// Whether the workflow creates a new lesson or re-edits a saved one.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    New,
    Editing(SavedLesson),
}

/// Where the caller should go after a cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterCancel {
    /// Back to the input form with the draft discarded.
    Input,
    /// Back to the untouched saved lesson.
    ShowLesson(LessonId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The response belonged to a cancelled or superseded request.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Generation,
    Refinement,
}

/// Proof that a request was started; required to apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    epoch: u64,
    kind: RequestKind,
}

/// Everything the generator needs for a fresh lesson.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub ticket: RequestTicket,
    pub topic: String,
    pub student: Student,
    pub previous_topics: Vec<String>,
}

/// Everything the generator needs to rewrite the draft.
#[derive(Debug, Clone)]
pub struct RefinementRequest {
    pub ticket: RequestTicket,
    pub document: LessonDocument,
    pub instruction: String,
    pub history: Vec<ChatTurn>,
}

pub struct LessonWorkflow {
    mode: Mode,
    step: Step,
    topic: String,
    student_id: Option<StudentId>,
    draft: Option<LessonDocument>,
    transcript: Vec<ChatTurn>,
    last_explanation: Option<String>,
    in_flight: Option<RequestTicket>,
    epoch: u64,
    closed: bool,
}

impl LessonWorkflow {
    /// Starts a new lesson in the Input step, optionally with a preselected student.
    pub fn new(student_id: Option<StudentId>) -> Self {
        Self {
            mode: Mode::New,
            step: Step::Input,
            topic: String::new(),
            student_id,
            draft: None,
            transcript: Vec::new(),
            last_explanation: None,
            in_flight: None,
            epoch: 0,
            closed: false,
        }
    }

    /// Opens a saved lesson for review, with its document as the draft.
    pub fn edit(lesson: &SavedLesson) -> Self {
        Self {
            mode: Mode::Editing(lesson.clone()),
            step: Step::Review,
            topic: lesson.topic.clone(),
            student_id: Some(lesson.student_id.clone()),
            draft: Some(lesson.data.clone()),
            ..Self::new(None)
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn student_id(&self) -> Option<&StudentId> {
        self.student_id.as_ref()
    }

    pub fn draft(&self) -> Option<&LessonDocument> {
        self.draft.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The generator's explanation of the most recent successful refinement.
    pub fn last_explanation(&self) -> Option<&str> {
        self.last_explanation.as_deref()
    }

    /// Instructions and explanations of successful refinements, oldest first.
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Stores the trimmed topic. A draft under review cannot lose its topic;
    /// in the Input step a blank topic is caught when generation starts.
    pub fn set_topic(&mut self, topic: impl Into<String>) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        let topic = topic.into().trim().to_string();
        if topic.is_empty() && self.step == Step::Review {
            return Err(WorkflowError::Validation("Please enter a topic.".to_string()));
        }
        self.topic = topic;
        Ok(())
    }

    pub fn select_student(&mut self, id: StudentId) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        self.expect_step(Step::Input)?;
        self.student_id = Some(id);
        Ok(())
    }

    // --- Generation ---

    /// Validates the input and reserves the workflow for one generation call.
    pub fn begin_generation(&mut self, library: &Library) -> Result<GenerationRequest, WorkflowError> {
        self.ensure_open()?;
        self.expect_step(Step::Input)?;
        self.ensure_idle()?;

        let topic = self.topic.trim().to_string();
        if topic.is_empty() {
            return Err(WorkflowError::Validation("Please enter a topic.".to_string()));
        }
        let student = self
            .student_id
            .as_ref()
            .and_then(|id| library.student(id))
            .ok_or_else(|| WorkflowError::Validation("Please select a valid student.".to_string()))?;

        self.topic = topic.clone();
        let ticket = self.issue(RequestKind::Generation);
        let previous_topics = library.previous_topics(&student.id);
        info!(
            student_id = %student.id,
            topic = %topic,
            history = previous_topics.len(),
            "Requesting lesson generation."
        );
        Ok(GenerationRequest {
            ticket,
            topic,
            student: student.clone(),
            previous_topics,
        })
    }

    /// Applies a generation result. On success the workflow moves to Review.
    pub fn complete_generation(
        &mut self,
        ticket: RequestTicket,
        result: PortResult<LessonDocument>,
    ) -> Result<Completion, WorkflowError> {
        if !self.accept(ticket, RequestKind::Generation) {
            return Ok(Completion::Stale);
        }
        match result {
            Ok(document) => {
                self.draft = Some(document);
                self.step = Step::Review;
                Ok(Completion::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Lesson generation failed.");
                Err(WorkflowError::Generation {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Runs one generation end to end against `generator`.
    pub async fn generate(
        &mut self,
        generator: &dyn LessonGenerator,
        library: &Library,
    ) -> Result<Completion, WorkflowError> {
        let request = self.begin_generation(library)?;
        let result = generator
            .generate_lesson(&request.topic, &request.student, &request.previous_topics)
            .await;
        self.complete_generation(request.ticket, result)
    }

    // --- Review ---

    /// Replaces the draft with a copy that has `edit` applied.
    pub fn apply_edit(&mut self, edit: &LessonEdit) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        self.expect_step(Step::Review)?;
        self.ensure_idle()?;
        let current = self.draft.as_ref().ok_or(WorkflowError::WrongStep {
            expected: Step::Review,
        })?;
        let next = apply_edit(current, edit)?;
        self.draft = Some(next);
        Ok(())
    }

    /// Reserves the workflow for one refinement call on the current draft.
    pub fn begin_refinement(&mut self, instruction: &str) -> Result<RefinementRequest, WorkflowError> {
        self.ensure_open()?;
        self.expect_step(Step::Review)?;
        self.ensure_idle()?;

        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(WorkflowError::Validation(
                "Please describe the changes you want.".to_string(),
            ));
        }
        let document = self.draft.clone().ok_or(WorkflowError::WrongStep {
            expected: Step::Review,
        })?;

        let ticket = self.issue(RequestKind::Refinement);
        info!(instruction, "Requesting lesson refinement.");
        Ok(RefinementRequest {
            ticket,
            document,
            instruction: instruction.to_string(),
            history: self.transcript.clone(),
        })
    }

    /// Applies a refinement result. Failures leave the draft exactly as it was.
    pub fn complete_refinement(
        &mut self,
        ticket: RequestTicket,
        instruction: &str,
        result: PortResult<RefinedLesson>,
    ) -> Result<Completion, WorkflowError> {
        if !self.accept(ticket, RequestKind::Refinement) {
            return Ok(Completion::Stale);
        }
        match result {
            Ok(refined) => {
                self.draft = Some(refined.lesson);
                self.transcript.push(ChatTurn {
                    role: ChatRole::User,
                    text: instruction.trim().to_string(),
                });
                self.transcript.push(ChatTurn {
                    role: ChatRole::Model,
                    text: refined.explanation.clone(),
                });
                self.last_explanation = Some(refined.explanation);
                Ok(Completion::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Lesson refinement failed; keeping the previous draft.");
                Err(WorkflowError::Refinement {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Runs one refinement end to end against `generator`.
    pub async fn refine(
        &mut self,
        generator: &dyn LessonGenerator,
        instruction: &str,
    ) -> Result<Completion, WorkflowError> {
        let request = self.begin_refinement(instruction)?;
        let result = generator
            .refine_lesson(&request.document, &request.instruction, &request.history)
            .await;
        self.complete_refinement(request.ticket, &request.instruction, result)
    }

    // --- Terminal actions ---

    /// Commits the draft. New lessons get a fresh identity, timestamp and name
    /// snapshot; edited lessons keep identity, timestamp and snapshot and take
    /// the current topic and draft.
    pub async fn approve(&mut self, library: &mut Library) -> Result<SavedLesson, WorkflowError> {
        self.ensure_open()?;
        self.expect_step(Step::Review)?;
        let draft = self.draft.clone().ok_or(WorkflowError::WrongStep {
            expected: Step::Review,
        })?;
        if self.topic.trim().is_empty() {
            return Err(WorkflowError::Validation("Please enter a topic.".to_string()));
        }

        let result = match &self.mode {
            Mode::Editing(original) => {
                let current = library
                    .lesson(&original.id)
                    .cloned()
                    .ok_or_else(|| LibraryError::LessonNotFound(original.id.clone()))?;
                let record = SavedLesson {
                    topic: self.topic.clone(),
                    data: draft,
                    ..current
                };
                library.update_lesson(record).await
            }
            Mode::New => {
                let student_id = self.student_id.clone().unwrap_or_default();
                let snapshot = library
                    .student(&student_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| UNKNOWN_STUDENT.to_string());
                let record = SavedLesson {
                    id: LessonId::new(),
                    topic: self.topic.clone(),
                    student_id,
                    profile_snapshot: snapshot,
                    created_at: Utc::now(),
                    data: draft,
                };
                library.add_lesson(record.clone()).await.map(|()| record)
            }
        };

        // The library has already taken the record, even if persisting failed.
        self.finish();
        Ok(result?)
    }

    /// Drops the draft without persisting anything.
    pub fn cancel(&mut self) -> AfterCancel {
        self.epoch += 1;
        self.in_flight = None;
        match &self.mode {
            Mode::Editing(original) => {
                let id = original.id.clone();
                self.finish();
                AfterCancel::ShowLesson(id)
            }
            Mode::New => {
                self.step = Step::Input;
                self.draft = None;
                self.transcript.clear();
                self.last_explanation = None;
                AfterCancel::Input
            }
        }
    }

    // --- Internals ---

    fn issue(&mut self, kind: RequestKind) -> RequestTicket {
        let ticket = RequestTicket {
            epoch: self.epoch,
            kind,
        };
        self.in_flight = Some(ticket);
        ticket
    }

    fn accept(&mut self, ticket: RequestTicket, kind: RequestKind) -> bool {
        if self.closed || ticket.kind != kind || self.in_flight != Some(ticket) {
            debug!(?ticket, "Ignoring a response for an abandoned request.");
            return false;
        }
        self.in_flight = None;
        true
    }

    fn finish(&mut self) {
        self.epoch += 1;
        self.in_flight = None;
        self.closed = true;
        self.draft = None;
    }

    fn ensure_open(&self) -> Result<(), WorkflowError> {
        if self.closed {
            Err(WorkflowError::Closed)
        } else {
            Ok(())
        }
    }

    fn ensure_idle(&self) -> Result<(), WorkflowError> {
        if self.in_flight.is_some() {
            Err(WorkflowError::Busy)
        } else {
            Ok(())
        }
    }

    fn expect_step(&self, expected: Step) -> Result<(), WorkflowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WorkflowError::WrongStep { expected })
        }
    }
}
