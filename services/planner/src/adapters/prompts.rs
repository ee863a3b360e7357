//! services/planner/src/adapters/prompts.rs
//!
//! Prompt text, the lesson JSON schema and response parsing shared by every
//! lesson generator adapter.

use lesson_planner_core::domain::{ChatRole, ChatTurn, LessonDocument, Student};
use lesson_planner_core::ports::{PortError, PortResult};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::OnceLock;

pub const GENERATION_TEMPERATURE: f32 = 0.7;
pub const REFINEMENT_TEMPERATURE: f32 = 0.4;

pub const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert ESL curriculum developer who writes Audio-Lingual lessons for Brazilian learners. Produce one complete lesson as a JSON object for the given Topic, Student Profile and lesson History.

Pedagogy:
1. Every Student Book item (verbs, new words, useful phrases, grammar examples, real life sentences) gives the English text and its Portuguese translation.
2. Drill sentences in the Teacher's Guide use the substitution format:
   Base sentence in English. / Portuguese translation. / cue 1 / cue 2
   e.g. "I like to eat pizza. / Eu gosto de comer pizza. / pasta / salad"
3. Progression:
   - Verbs: 2 high-frequency verbs tied to the topic.
   - New Words: 10 to 14 nouns or adjectives tied to the topic.
   - Useful Phrases: 3 or 4 common or idiomatic phrases that suit this student.
   - Grammar: one rule suited to the student's level, applied to the topic.
   - Real Life: sentences in context mixing the new grammar and vocabulary.

Personalisation:
- Adapt all vocabulary and sentences to the topic.
- Match complexity, tone and Real Life scenarios to the student's 1-5 star skills, interests, likes and dislikes. A 1-star learner gets short, simple sentences.
- The History lists recently studied topics. Build on them but never repeat their vocabulary or grammar points.

Fields:
- lesson_metadata: a sensible lesson number and a title for the topic.
- check_it_out: 2 or 3 small boxes with quick tips or grouped vocabulary.
- assessment: 2 quick translation questions and 1 or 2 situational questions.
- drills: durations add up to a 50-60 minute class (about 8' verbs, 12' words, 6' phrases, 12' grammar)."#;

pub const REFINE_SYSTEM_INSTRUCTIONS: &str = "You are a strict JSON editor. Change only what the user asks for, \
or adjust difficulty and tone when asked. Keep the schema exactly as given.";

/// The user turn for a fresh lesson.
pub fn lesson_prompt(topic: &str, student: &Student, previous_topics: &[String]) -> String {
    let skills = &student.skills;
    let profile = format!(
        "STUDENT PROFILE:\n\
         - Name: {}\n\
         - Interests: {}\n\
         - Likes: {}\n\
         - Dislikes: {}\n\
         - Proficiency (1-5 stars):\n\
         \x20 * Speaking: {}\n\
         \x20 * Listening: {}\n\
         \x20 * Reading: {}\n\
         \x20 * Writing: {}",
        student.name,
        student.interests,
        student.likes,
        student.dislikes,
        skills.speaking,
        skills.listening,
        skills.reading,
        skills.writing,
    );

    let history = if previous_topics.is_empty() {
        "HISTORY: This is the student's first lesson. Start fresh.".to_string()
    } else {
        format!(
            "HISTORY (last {} lessons): The student has already studied: [{}]. Do not repeat these lessons, build on them.",
            previous_topics.len(),
            previous_topics.join(", ")
        )
    };

    format!(
        "Create a personalised English lesson.\n\n\
         Target Topic: \"{topic}\"\n\n\
         {profile}\n\n\
         {history}\n\n\
         Return the lesson as valid JSON following the schema. Make the Real Life and Useful Phrases \
         sections relevant to the student's interests and job, if mentioned."
    )
}

/// The user turn for a refinement of `document`.
pub fn refine_prompt(document: &LessonDocument, instruction: &str, history: &[ChatTurn]) -> PortResult<String> {
    let current = serde_json::to_string(document).map_err(|e| PortError::Unexpected(e.to_string()))?;
    let conversation = history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                ChatRole::User => "USER",
                ChatRole::Model => "ASSISTANT",
            };
            format!("{speaker}: {}", turn.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "TASK: Edit an existing English lesson according to the user's feedback.\n\n\
         CURRENT LESSON JSON:\n{current}\n\n\
         CONVERSATION HISTORY:\n{conversation}\n\n\
         REQUESTED CHANGES:\n\"{instruction}\"\n\n\
         1. Read the request in light of the conversation (e.g. \"undo that\", \"make it harder\").\n\
         2. Change the JSON only as needed to satisfy it, keeping format and teaching quality.\n\
         3. Briefly explain what you changed.\n\
         4. Return a JSON object with \"lesson\" (the full modified lesson) and \"explanation\"."
    ))
}

//=========================================================================================
// Schema
//=========================================================================================

fn bilingual_list() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "english": { "type": "string" },
                "portuguese": { "type": "string" }
            },
            "required": ["english", "portuguese"]
        }
    })
}

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

fn drill() -> Value {
    json!({
        "type": "object",
        "properties": {
            "duration_minutes": { "type": "integer" },
            "sentences": string_list()
        },
        "required": ["duration_minutes", "sentences"]
    })
}

/// JSON schema of a lesson document, in lowercase JSON-schema type names.
pub fn lesson_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "lesson_metadata": {
                "type": "object",
                "properties": {
                    "lesson_number": { "type": "integer" },
                    "lesson_title": { "type": "string" },
                    "category": { "type": "string", "description": "e.g. Input Lesson, Output Lesson" }
                },
                "required": ["lesson_number", "lesson_title"]
            },
            "student_book_content": {
                "type": "object",
                "properties": {
                    "verbs_header": bilingual_list(),
                    "new_words": bilingual_list(),
                    "useful_phrases": bilingual_list(),
                    "grammar": {
                        "type": "object",
                        "properties": {
                            "topics": string_list(),
                            "examples": bilingual_list()
                        },
                        "required": ["topics", "examples"]
                    },
                    "real_life": bilingual_list(),
                    "check_it_out": {
                        "type": "object",
                        "properties": {
                            "boxes": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "title": { "type": "string" },
                                        "content": string_list()
                                    },
                                    "required": ["title", "content"]
                                }
                            }
                        },
                        "required": ["boxes"]
                    }
                },
                "required": ["verbs_header", "new_words", "useful_phrases", "grammar", "real_life", "check_it_out"]
            },
            "teachers_guide_content": {
                "type": "object",
                "properties": {
                    "header_info": {
                        "type": "object",
                        "properties": {
                            "learning_objectives": string_list(),
                            "grammar_focus": string_list()
                        },
                        "required": ["learning_objectives", "grammar_focus"]
                    },
                    "assessment": {
                        "type": "object",
                        "properties": {
                            "duration_minutes": { "type": "integer" },
                            "questions": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "question": { "type": "string" },
                                        "answer": { "type": "string" }
                                    },
                                    "required": ["question", "answer"]
                                }
                            }
                        },
                        "required": ["duration_minutes", "questions"]
                    },
                    "drills": {
                        "type": "object",
                        "properties": {
                            "verbs_drill": drill(),
                            "new_words_drill": drill(),
                            "useful_phrases_drill": drill(),
                            "grammar_drill": drill()
                        },
                        "required": ["verbs_drill", "new_words_drill", "useful_phrases_drill", "grammar_drill"]
                    },
                    "procedures": {
                        "type": "object",
                        "properties": {
                            "homework_instructions": string_list(),
                            "skills_check": {
                                "type": "object",
                                "properties": { "skills": string_list() },
                                "required": ["skills"]
                            }
                        },
                        "required": ["homework_instructions", "skills_check"]
                    }
                },
                "required": ["header_info", "assessment", "drills", "procedures"]
            }
        },
        "required": ["lesson_metadata", "student_book_content", "teachers_guide_content"]
    })
}

/// Schema of a refinement answer: the full lesson plus an explanation.
pub fn refine_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "lesson": lesson_schema(),
            "explanation": {
                "type": "string",
                "description": "A brief explanation of the changes made to the lesson."
            }
        },
        "required": ["lesson", "explanation"]
    })
}

//=========================================================================================
// Parsing
//=========================================================================================

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").ok())
        .as_ref()
}

/// Parses a model's JSON answer, tolerating a surrounding markdown code fence.
pub fn parse_json_payload<T: DeserializeOwned>(text: &str) -> PortResult<T> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PortError::Unexpected("No content generated".to_string()));
    }
    let body = fence_regex()
        .and_then(|re| re.captures(trimmed))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);
    serde_json::from_str(body)
        .map_err(|e| PortError::Unexpected(format!("Model response did not match the lesson schema: {e}")))
}
