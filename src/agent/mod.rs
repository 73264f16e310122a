//! Analysis agent - answers a question over assembled log context
//!
//! The agent never fails. Provider errors and output that cannot be
//! validated (after correction attempts) collapse into a degraded
//! [`AnalysisResponse`] whose answer starts with [`ERROR_PREFIX`].

mod model;
mod openai;
mod schema;

pub use model::{ChatMessage, LanguageModel, OutputSchema, Role};
pub use openai::OpenAiChatModel;
pub use schema::{output_schema, validate, AnalysisResponse};

use crate::config::{Credentials, LlmSection};
use crate::context::AnalysisRequest;
use crate::error::{Error, Result};

/// Prefix of every degraded answer
pub const ERROR_PREFIX: &str = "Error analyzing logs: ";

pub const SYSTEM_PROMPT: &str = "You are an intelligent log analysis assistant. \
Analyze the provided log entries to answer the user's question. \
Give a clear, comprehensive answer and identify patterns, trends and errors in the logs. \
Include the log entries that support your answer in relevant_logs, \
and base every finding on the actual data provided. \
Always respond with the answer, the relevant log entries and the total number of logs analyzed.";

/// Result of one agent run before collapsing to a response
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcome {
    Success(AnalysisResponse),
    Failure { message: String },
}

impl AgentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AgentOutcome::Success(_))
    }

    /// Collapse to a response; failures become the degraded default
    pub fn into_response(self) -> AnalysisResponse {
        match self {
            AgentOutcome::Success(response) => response,
            AgentOutcome::Failure { message } => {
                AnalysisResponse::failure(format!("{}{}", ERROR_PREFIX, message))
            }
        }
    }
}

pub struct AnalysisAgent {
    model: Box<dyn LanguageModel>,
    max_repair_attempts: usize,
}

impl AnalysisAgent {
    pub fn new(model: Box<dyn LanguageModel>, max_repair_attempts: usize) -> Self {
        Self {
            model,
            max_repair_attempts,
        }
    }

    /// Agent backed by the configured chat completions endpoint
    pub fn from_config(config: &LlmSection, credentials: Credentials) -> Result<Self> {
        let model = OpenAiChatModel::new(config, credentials)?;
        Ok(Self::new(Box::new(model), config.max_repair_attempts))
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn run(&self, request: &AnalysisRequest) -> AgentOutcome {
        match self.try_run(request) {
            Ok(response) => AgentOutcome::Success(response),
            Err(e) => {
                log::warn!("log analysis failed: {}", e);
                AgentOutcome::Failure {
                    message: e.to_string(),
                }
            }
        }
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> AnalysisResponse {
        self.run(request).into_response()
    }

    fn try_run(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let schema = output_schema();
        let mut messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(request.prompt()?),
        ];

        log::info!(
            "analyzing {} log entries with {}",
            request.len(),
            self.model.model_name()
        );

        let mut attempt = 0;
        loop {
            let raw = self.model.complete(&messages, &schema)?;

            match validate(&raw, request.len()) {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_repair_attempts => {
                    attempt += 1;
                    log::warn!(
                        "model output rejected ({}), requesting correction {}/{}",
                        e,
                        attempt,
                        self.max_repair_attempts
                    );
                    messages.push(ChatMessage::assistant(raw));
                    messages.push(ChatMessage::user(correction_prompt(&e)));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn correction_prompt(error: &Error) -> String {
    format!(
        "Your previous reply did not match the required response format: {}. \
         Reply again with only a JSON object containing `answer` (string), \
         `relevant_logs` (array of objects) and `total_logs_analyzed` (integer).",
        error
    )
}
