//! OpenAI-compatible `/chat/completions` client with structured output

use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::model::{ChatMessage, LanguageModel, OutputSchema};
use crate::config::{Credentials, LlmSection};
use crate::error::{ProviderError, Result};
use crate::http;

pub struct OpenAiChatModel {
    http: HttpClient,
    url: String,
    model: String,
    temperature: f32,
    credentials: Credentials,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a Value,
    // `relevant_logs` items are open objects, which strict mode rejects
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiChatModel {
    pub fn new(config: &LlmSection, credentials: Credentials) -> Result<Self> {
        let http = http::build_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            http,
            url: http::endpoint(&config.base_url, "chat/completions"),
            model: config.model.clone(),
            temperature: config.temperature,
            credentials,
        })
    }
}

impl LanguageModel for OpenAiChatModel {
    fn complete(
        &self,
        messages: &[ChatMessage],
        schema: &OutputSchema,
    ) -> std::result::Result<String, ProviderError> {
        log::debug!(
            "requesting completion from {} ({} messages)",
            self.model,
            messages.len()
        );

        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &schema.name,
                    schema: &schema.schema,
                    strict: false,
                },
            },
        };

        let response: ChatResponse =
            http::post_json(&self.http, &self.url, &self.credentials, &body)?;
        first_content(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn first_content(response: ChatResponse) -> std::result::Result<String, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("response has no choices".to_string()))?;

    if let Some(refusal) = choice.message.refusal {
        return Err(ProviderError::Refusal(refusal));
    }

    choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse("completion has no content".to_string()))
}
