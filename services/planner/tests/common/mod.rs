#![allow(dead_code)]

use async_trait::async_trait;
use lesson_planner_core::{
    domain::{ChatTurn, LessonDocument, RefinedLesson, Student},
    ports::{LessonGenerator, PortError, PortResult},
};
use planner_lib::adapters::DbAdapter;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A fresh in-memory SQLite store with migrations applied.
pub async fn memory_db(quota: Option<usize>) -> Arc<DbAdapter> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    let db = DbAdapter::new(pool, quota);
    db.run_migrations().await.expect("run migrations");
    Arc::new(db)
}

pub fn document(title: &str) -> LessonDocument {
    let mut doc = LessonDocument::default();
    doc.lesson_metadata.lesson_number = 1;
    doc.lesson_metadata.lesson_title = title.to_string();
    doc
}

/// A generator that answers from a queue and records what it was asked.
#[derive(Default)]
pub struct ScriptedGenerator {
    lessons: Mutex<VecDeque<PortResult<LessonDocument>>>,
    refinements: Mutex<VecDeque<PortResult<RefinedLesson>>>,
    pub seen_previous_topics: Mutex<Vec<Vec<String>>>,
    pub seen_instructions: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn with_lesson(self, doc: LessonDocument) -> Self {
        self.lessons.lock().unwrap().push_back(Ok(doc));
        self
    }

    pub fn with_refinement(self, doc: LessonDocument, explanation: &str) -> Self {
        self.refinements.lock().unwrap().push_back(Ok(RefinedLesson {
            lesson: doc,
            explanation: explanation.to_string(),
        }));
        self
    }

    pub fn with_failed_refinement(self, message: &str) -> Self {
        self.refinements
            .lock()
            .unwrap()
            .push_back(Err(PortError::Unexpected(message.to_string())));
        self
    }

    pub fn generation_calls(&self) -> usize {
        self.seen_previous_topics.lock().unwrap().len()
    }

    pub fn without_key() -> Self {
        let generator = Self::default();
        generator
            .lessons
            .lock()
            .unwrap()
            .push_back(Err(PortError::MissingCredential));
        generator
    }
}

#[async_trait]
impl LessonGenerator for ScriptedGenerator {
    async fn generate_lesson(
        &self,
        _topic: &str,
        _student: &Student,
        previous_topics: &[String],
    ) -> PortResult<LessonDocument> {
        self.seen_previous_topics
            .lock()
            .unwrap()
            .push(previous_topics.to_vec());
        self.lessons
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("no scripted lesson".to_string())))
    }

    async fn refine_lesson(
        &self,
        _document: &LessonDocument,
        instruction: &str,
        _history: &[ChatTurn],
    ) -> PortResult<RefinedLesson> {
        self.seen_instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        self.refinements
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("no scripted refinement".to_string())))
    }
}
