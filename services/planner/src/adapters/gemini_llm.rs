//! services/planner/src/adapters/gemini_llm.rs
//!
//! Lesson generation through Google's Gemini `generateContent` REST endpoint.

use super::prompts::{
    self, GENERATION_TEMPERATURE, REFINEMENT_TEMPERATURE, REFINE_SYSTEM_INSTRUCTIONS,
    SYSTEM_INSTRUCTIONS,
};
use async_trait::async_trait;
use lesson_planner_core::{
    domain::{ChatTurn, LessonDocument, RefinedLesson, Student},
    ports::{LessonGenerator, PortError, PortResult},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

//=========================================================================================
// Wire types
//=========================================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct PartResponse {
    text: String,
}

/// Gemini's schema dialect spells JSON types in upper case.
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let converted = match (k.as_str(), v) {
                        ("type", Value::String(t)) => Value::String(t.to_uppercase()),
                        _ => to_gemini_schema(v),
                    };
                    (k.clone(), converted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LessonGenerator` against the Gemini API.
#[derive(Clone)]
pub struct GeminiLessonAdapter {
    http: Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiLessonAdapter {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model,
        }
    }

    async fn generate_json(
        &self,
        system: &str,
        user: String,
        schema: Value,
        temperature: f32,
    ) -> PortResult<String> {
        let api_key = self.api_key.as_deref().ok_or(PortError::MissingCredential)?;

        let body = GeminiRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: user }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: to_gemini_schema(&schema),
                temperature,
            },
        };

        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "Gemini returned {status}: {detail}"
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| PortError::Unexpected("No content generated".to_string()))
    }
}

//=========================================================================================
// `LessonGenerator` Trait Implementation
//=========================================================================================

#[async_trait]
impl LessonGenerator for GeminiLessonAdapter {
    async fn generate_lesson(
        &self,
        topic: &str,
        student: &Student,
        previous_topics: &[String],
    ) -> PortResult<LessonDocument> {
        info!(topic, model = %self.model, "Requesting lesson from Gemini.");
        let text = self
            .generate_json(
                SYSTEM_INSTRUCTIONS,
                prompts::lesson_prompt(topic, student, previous_topics),
                prompts::lesson_schema(),
                GENERATION_TEMPERATURE,
            )
            .await?;
        debug!(bytes = text.len(), "Lesson payload received.");
        prompts::parse_json_payload(&text)
    }

    async fn refine_lesson(
        &self,
        document: &LessonDocument,
        instruction: &str,
        history: &[ChatTurn],
    ) -> PortResult<RefinedLesson> {
        info!(instruction, turns = history.len(), "Requesting refinement from Gemini.");
        let text = self
            .generate_json(
                REFINE_SYSTEM_INSTRUCTIONS,
                prompts::refine_prompt(document, instruction, history)?,
                prompts::refine_schema(),
                REFINEMENT_TEMPERATURE,
            )
            .await?;
        prompts::parse_json_payload(&text)
    }
}
