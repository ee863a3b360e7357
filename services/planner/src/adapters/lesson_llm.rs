//! services/planner/src/adapters/lesson_llm.rs
//!
//! This module contains the OpenAI adapter for lesson generation.
//! It implements the `LessonGenerator` port from the `core` crate.

use super::prompts::{
    self, GENERATION_TEMPERATURE, REFINEMENT_TEMPERATURE, REFINE_SYSTEM_INSTRUCTIONS,
    SYSTEM_INSTRUCTIONS,
};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use lesson_planner_core::{
    domain::{ChatTurn, LessonDocument, RefinedLesson, Student},
    ports::{LessonGenerator, PortError, PortResult},
};
use serde_json::Value;
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LessonGenerator` using an OpenAI-compatible LLM.
/// Without a client every call fails with `PortError::MissingCredential`.
#[derive(Clone)]
pub struct OpenAiLessonAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiLessonAdapter {
    pub fn new(client: Option<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the adapter from an optional API key.
    pub fn from_api_key(api_key: Option<String>, model: String) -> Self {
        let client = api_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| Client::with_config(OpenAIConfig::new().with_api_key(key)));
        Self::new(client, model)
    }

    async fn complete_json(
        &self,
        system: &str,
        user: String,
        schema_name: &str,
        schema: Value,
        temperature: f32,
    ) -> PortResult<String> {
        let client = self.client.as_ref().ok_or(PortError::MissingCredential)?;

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(temperature)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: schema_name.to_string(),
                    schema: Some(schema),
                    strict: Some(false),
                },
            })
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        match response.choices.into_iter().next() {
            Some(choice) => choice.message.content.ok_or_else(|| {
                PortError::Unexpected("Lesson LLM response contained no text content.".to_string())
            }),
            None => Err(PortError::Unexpected(
                "Lesson LLM returned no choices in its response.".to_string(),
            )),
        }
    }
}

//=========================================================================================
// `LessonGenerator` Trait Implementation
//=========================================================================================

#[async_trait]
impl LessonGenerator for OpenAiLessonAdapter {
    async fn generate_lesson(
        &self,
        topic: &str,
        student: &Student,
        previous_topics: &[String],
    ) -> PortResult<LessonDocument> {
        info!(topic, model = %self.model, "Requesting lesson from OpenAI.");
        let content = self
            .complete_json(
                SYSTEM_INSTRUCTIONS,
                prompts::lesson_prompt(topic, student, previous_topics),
                "lesson",
                prompts::lesson_schema(),
                GENERATION_TEMPERATURE,
            )
            .await?;
        debug!(bytes = content.len(), "Lesson payload received.");
        prompts::parse_json_payload(&content)
    }

    async fn refine_lesson(
        &self,
        document: &LessonDocument,
        instruction: &str,
        history: &[ChatTurn],
    ) -> PortResult<RefinedLesson> {
        info!(instruction, turns = history.len(), "Requesting refinement from OpenAI.");
        let content = self
            .complete_json(
                REFINE_SYSTEM_INSTRUCTIONS,
                prompts::refine_prompt(document, instruction, history)?,
                "refined_lesson",
                prompts::refine_schema(),
                REFINEMENT_TEMPERATURE,
            )
            .await?;
        prompts::parse_json_payload(&content)
    }
}
