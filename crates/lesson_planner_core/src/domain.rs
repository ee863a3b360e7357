//! crates/lesson_planner_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! The serde shape of these structs is the persisted shape: record wrappers use
//! camelCase field names, the lesson document itself uses snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Identifiers
//=========================================================================================

/// Opaque identity of a student profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque identity of a saved lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(pub String);

impl LessonId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LessonId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//=========================================================================================
// Students
//=========================================================================================

/// A 1–5 star proficiency rating. Out-of-range input is clamped on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct SkillRating(u8);

impl SkillRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for SkillRating {
    fn default() -> Self {
        Self(3)
    }
}

impl From<i64> for SkillRating {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<SkillRating> for u8 {
    fn from(value: SkillRating) -> Self {
        value.0
    }
}

impl fmt::Display for SkillRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentSkills {
    pub speaking: SkillRating,
    pub listening: SkillRating,
    pub reading: SkillRating,
    pub writing: SkillRating,
}

/// A student profile as stored in the Students collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub interests: String,
    pub likes: String,
    pub dislikes: String,
    pub skills: StudentSkills,
    pub created_at: DateTime<Utc>,
}

/// The editable part of a student, as collected by a profile form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentProfile {
    pub name: String,
    pub interests: String,
    pub likes: String,
    pub dislikes: String,
    pub skills: StudentSkills,
}

impl Student {
    /// Builds a new record with a fresh identity and creation timestamp.
    pub fn from_profile(profile: StudentProfile) -> Self {
        Self {
            id: StudentId::new(),
            name: profile.name,
            interests: profile.interests,
            likes: profile.likes,
            dislikes: profile.dislikes,
            skills: profile.skills,
            created_at: Utc::now(),
        }
    }

    pub fn profile(&self) -> StudentProfile {
        StudentProfile {
            name: self.name.clone(),
            interests: self.interests.clone(),
            likes: self.likes.clone(),
            dislikes: self.dislikes.clone(),
            skills: self.skills,
        }
    }
}

//=========================================================================================
// Saved lessons
//=========================================================================================

/// A persisted, identified wrapper around a lesson document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedLesson {
    pub id: LessonId,
    pub topic: String,
    pub student_id: StudentId,
    /// Student name captured at save time; survives deletion of the student.
    pub profile_snapshot: String,
    pub created_at: DateTime<Utc>,
    pub data: LessonDocument,
}

//=========================================================================================
// Lesson document
//=========================================================================================

/// The structured content produced by the generator for one lesson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonDocument {
    pub lesson_metadata: LessonMetadata,
    pub student_book_content: StudentBookContent,
    pub teachers_guide_content: TeachersGuideContent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonMetadata {
    pub lesson_number: i64,
    pub lesson_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// An English text paired with its Portuguese translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BilingualItem {
    pub english: String,
    pub portuguese: String,
}

impl BilingualItem {
    pub fn new(english: impl Into<String>, portuguese: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            portuguese: portuguese.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentBookContent {
    pub verbs_header: Vec<BilingualItem>,
    pub new_words: Vec<BilingualItem>,
    pub useful_phrases: Vec<BilingualItem>,
    pub grammar: GrammarSection,
    pub real_life: Vec<BilingualItem>,
    pub check_it_out: CheckItOut,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarSection {
    pub topics: Vec<String>,
    pub examples: Vec<BilingualItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckItOut {
    pub boxes: Vec<TipBox>,
}

/// A titled "check it out" box of short tip lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipBox {
    pub title: String,
    pub content: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeachersGuideContent {
    pub header_info: HeaderInfo,
    pub assessment: Assessment,
    pub drills: Drills,
    pub procedures: Procedures,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderInfo {
    pub learning_objectives: Vec<String>,
    pub grammar_focus: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assessment {
    pub duration_minutes: i64,
    pub questions: Vec<AssessmentQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentQuestion {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Drills {
    pub verbs_drill: DrillSection,
    pub new_words_drill: DrillSection,
    pub useful_phrases_drill: DrillSection,
    pub grammar_drill: DrillSection,
}

/// A timed block of substitution-drill sentences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillSection {
    pub duration_minutes: i64,
    pub sentences: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Procedures {
    pub homework_instructions: Vec<String>,
    pub skills_check: SkillsCheck,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsCheck {
    pub skills: Vec<String>,
}

//=========================================================================================
// Refinement
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a refinement conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// What the generator returns for a refinement request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinedLesson {
    pub lesson: LessonDocument,
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_rating_clamps_out_of_range_values() {
        assert_eq!(SkillRating::new(0).get(), 1);
        assert_eq!(SkillRating::new(9).get(), 5);
        assert_eq!(SkillRating::new(4).get(), 4);

        let skills: StudentSkills =
            serde_json::from_str(r#"{"speaking": 7, "listening": -2, "reading": 2}"#).unwrap();
        assert_eq!(skills.speaking.get(), 5);
        assert_eq!(skills.listening.get(), 1);
        assert_eq!(skills.reading.get(), 2);
        assert_eq!(skills.writing, SkillRating::default());
    }

    #[test]
    fn saved_lesson_uses_camel_case_wrapper_and_snake_case_document() {
        let lesson = SavedLesson {
            id: LessonId::from("l-1"),
            topic: "Travel".to_string(),
            student_id: StudentId::from("s-1"),
            profile_snapshot: "Ana".to_string(),
            created_at: Utc::now(),
            data: LessonDocument::default(),
        };
        let value = serde_json::to_value(&lesson).unwrap();
        assert_eq!(value["studentId"], "s-1");
        assert_eq!(value["profileSnapshot"], "Ana");
        assert!(value.get("createdAt").is_some());
        assert!(value["data"]["student_book_content"]["verbs_header"].is_array());
        assert!(value["data"]["lesson_metadata"].get("category").is_none());
    }

    #[test]
    fn bilingual_items_never_lack_a_side() {
        let item: BilingualItem = serde_json::from_str(r#"{"english": "to travel"}"#).unwrap();
        assert_eq!(item.english, "to travel");
        assert_eq!(item.portuguese, "");
    }
}
