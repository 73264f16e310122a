//! Error types for loglens
//!
//! One taxonomy for the whole pipeline:
//! - `Shape` / `Json` reject ingest input before anything is written
//! - `StoreNotFound` separates "nothing ingested yet" from "no matches"
//! - `Provider` covers embedding and LLM transport failures
//! - `SchemaValidation` is raised inside the analysis agent and never escapes it

use std::path::PathBuf;
use thiserror::Error;

/// Result type for loglens operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// Top-level ingest value is not a JSON array
    #[error("expected a JSON array of log records, found {found}")]
    Shape { found: &'static str },

    /// Ingest input is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Search attempted before any ingest created the collection
    #[error("no vector store found at {}; ingest some logs first", path.display())]
    StoreNotFound { path: PathBuf },

    /// Embedding or LLM provider failure
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// LLM output does not conform to the response schema
    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    /// Collection was built with a different embedding model
    #[error("embedding model mismatch: collection uses {stored}, configured model is {configured}")]
    ModelMismatch { stored: String, configured: String },

    /// Ingest stopped part way; `stored` records were written before the failure
    #[error("ingest aborted after storing {stored} records: {source}")]
    IngestAborted {
        stored: usize,
        #[source]
        source: Box<Error>,
    },

    /// Vector index failure
    #[error("vector index error: {0}")]
    Store(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a shape error naming the JSON kind that was found
    pub fn shape(value: &serde_json::Value) -> Self {
        let found = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        };
        Error::Shape { found }
    }

    /// Wrap a vector index exception
    pub fn store(message: impl std::fmt::Display) -> Self {
        Error::Store(message.to_string())
    }
}

/// Failures talking to an external provider (embeddings or chat completions)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Connection refused, DNS failure, reset
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// 401/403 from the provider
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success HTTP status
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be decoded or is missing required data
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Model declined to produce the structured output
    #[error("model refused: {0}")]
    Refusal(String),
}

impl ProviderError {
    /// Classify an HTTP status + body into a provider error
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::Authentication(body),
            429 => ProviderError::RateLimited(body),
            code => ProviderError::Status { status: code, body },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::from_status(status, err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}
