//! AnalysisResponse contract and validation of raw model output

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::model::OutputSchema;
use crate::context::raw_object;
use crate::error::{Error, Result};

const SCHEMA_NAME: &str = "log_analysis_response";
const KNOWN_FIELDS: [&str; 3] = ["answer", "relevant_logs", "total_logs_analyzed"];

/// Structured answer to a log question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub answer: String,
    /// Entries the model cites, as JSON objects
    pub relevant_logs: Vec<Map<String, Value>>,
    /// Number of context entries sent to the model
    pub total_logs_analyzed: usize,
}

impl AnalysisResponse {
    /// Degraded response: no cited logs and nothing counted
    pub fn failure(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            relevant_logs: Vec::new(),
            total_logs_analyzed: 0,
        }
    }
}

/// Schema sent with every completion request
pub fn output_schema() -> OutputSchema {
    OutputSchema {
        name: SCHEMA_NAME.to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "Clear, comprehensive answer to the question"
                },
                "relevant_logs": {
                    "type": "array",
                    "description": "Log entries that support the answer",
                    "items": { "type": "object" }
                },
                "total_logs_analyzed": {
                    "type": "integer",
                    "minimum": 0
                }
            },
            "required": ["answer", "relevant_logs", "total_logs_analyzed"],
            "additionalProperties": false
        }),
    }
}

/// Validate raw model output into an [`AnalysisResponse`]
///
/// `total_logs_analyzed` is always replaced by `analyzed`. Non-object
/// entries in `relevant_logs` are wrapped as `{"raw_content": ...}`.
pub fn validate(raw: &str, analyzed: usize) -> Result<AnalysisResponse> {
    let body = strip_code_fence(raw);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::SchemaValidation(format!("output is not valid JSON: {}", e)))?;

    let Value::Object(mut object) = value else {
        return Err(Error::SchemaValidation(
            "output must be a JSON object".to_string(),
        ));
    };

    let answer = match object.remove("answer") {
        Some(Value::String(answer)) => answer,
        Some(_) => {
            return Err(Error::SchemaValidation(
                "field `answer` must be a string".to_string(),
            ))
        }
        None => {
            return Err(Error::SchemaValidation(
                "missing required field `answer`".to_string(),
            ))
        }
    };

    let relevant_logs = match object.remove("relevant_logs") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries.into_iter().map(as_log_object).collect(),
        Some(_) => {
            return Err(Error::SchemaValidation(
                "field `relevant_logs` must be an array".to_string(),
            ))
        }
    };

    let unknown: Vec<&String> = object
        .keys()
        .filter(|k| !KNOWN_FIELDS.contains(&k.as_str()))
        .collect();
    if !unknown.is_empty() {
        log::warn!("dropping unknown response fields: {:?}", unknown);
    }

    Ok(AnalysisResponse {
        answer,
        relevant_logs,
        total_logs_analyzed: analyzed,
    })
}

fn as_log_object(entry: Value) -> Map<String, Value> {
    match entry {
        Value::Object(map) => map,
        other => match raw_object(other) {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    }
}

/// Models sometimes wrap JSON in a markdown fence
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim()
}
