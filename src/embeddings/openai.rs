//! OpenAI-compatible `/embeddings` client

use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::EmbeddingEngine;
use crate::config::{Credentials, EmbeddingsSection};
use crate::error::{ProviderError, Result};
use crate::http;

/// Embedding generator backed by a remote embeddings endpoint
pub struct OpenAiEmbedder {
    http: HttpClient,
    url: String,
    model: String,
    dimension: usize,
    /// Sent as `dimensions`; `None` for models with a fixed output size
    requested_dimensions: Option<usize>,
    credentials: Credentials,
}

/// Model that only produces its native size and rejects `dimensions`
pub const FIXED_SIZE_MODEL: &str = "text-embedding-ada-002";
pub const FIXED_SIZE_DIMENSIONS: usize = 1536;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingsSection, credentials: Credentials) -> Result<Self> {
        let http = http::build_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            http,
            url: http::endpoint(&config.base_url, "embeddings"),
            model: config.model.clone(),
            dimension: config.dimensions,
            requested_dimensions: (config.model != FIXED_SIZE_MODEL).then_some(config.dimensions),
            credentials,
        })
    }

    fn request(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
        log::debug!("embedding {} texts with {}", texts.len(), self.model);

        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.requested_dimensions,
        };
        let response: EmbeddingResponse =
            http::post_json(&self.http, &self.url, &self.credentials, &body)?;

        collate(response.data, texts.len(), self.dimension)
    }
}

/// Restore input order and check every vector is present with the right length
fn collate(
    mut data: Vec<EmbeddingData>,
    expected: usize,
    dimension: usize,
) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
    if data.len() != expected {
        return Err(ProviderError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }

    data.sort_by_key(|d| d.index);

    let mut vectors = Vec::with_capacity(expected);
    for (position, item) in data.into_iter().enumerate() {
        if item.index != position {
            return Err(ProviderError::InvalidResponse(format!(
                "embedding indices are not contiguous (missing {})",
                position
            )));
        }
        if item.embedding.len() != dimension {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {}-dimensional embedding, got {}",
                dimension,
                item.embedding.len()
            )));
        }
        vectors.push(item.embedding);
    }

    Ok(vectors)
}

impl EmbeddingEngine for OpenAiEmbedder {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| ProviderError::InvalidResponse("no embedding returned".into()).into())
    }

    fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.request(texts)?)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
