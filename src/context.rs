//! Context assembler - retrieved chunks to a structured analysis request
//!
//! Chunk text that parses as JSON is passed through as-is; anything else is
//! wrapped as `{"raw_content": <text>}`. No chunk is dropped and retrieval
//! order is kept.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::gateway::RetrievalResult;

/// Key used when wrapping unparseable chunk text
pub const RAW_CONTENT_KEY: &str = "raw_content";

/// One log entry handed to the analysis agent
#[derive(Debug, Clone, PartialEq)]
pub enum ContextLog {
    /// Chunk text decoded back to its JSON value
    Structured(Value),
    /// Chunk text that is not valid JSON
    Raw(String),
}

impl ContextLog {
    /// Decode chunk text, falling back to [`ContextLog::Raw`]
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => ContextLog::Structured(value),
            Err(_) => ContextLog::Raw(text.to_string()),
        }
    }
}

impl Serialize for ContextLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ContextLog::Structured(value) => value.serialize(serializer),
            ContextLog::Raw(text) => raw_object(text.as_str()).serialize(serializer),
        }
    }
}

/// Wrap a value as `{"raw_content": value}`
pub(crate) fn raw_object(value: impl Into<Value>) -> Value {
    let mut map = Map::new();
    map.insert(RAW_CONTENT_KEY.to_string(), value.into());
    Value::Object(map)
}

/// Question plus the ordered context logs for one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub question: String,
    pub context_logs: Vec<ContextLog>,
}

impl AnalysisRequest {
    pub fn new(question: impl Into<String>, context_logs: Vec<ContextLog>) -> Self {
        Self {
            question: question.into(),
            context_logs,
        }
    }

    pub fn len(&self) -> usize {
        self.context_logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.context_logs.is_empty()
    }

    /// Render the user prompt: question, pretty-printed entries, instruction
    pub fn prompt(&self) -> Result<String> {
        let entries = serde_json::to_string_pretty(&self.context_logs)?;
        Ok(format!(
            "Question: {}\n\nLog Entries to Analyze:\n{}\n\n\
             Please analyze these logs to answer the question. \
             Provide insights, patterns, and specific findings.",
            self.question, entries
        ))
    }
}

/// Build the analysis request for a question from retrieved chunks
pub fn assemble(question: &str, retrieved: &RetrievalResult) -> AnalysisRequest {
    let context_logs = retrieved
        .iter()
        .map(|hit| ContextLog::from_text(&hit.chunk.text))
        .collect();

    AnalysisRequest::new(question, context_logs)
}
