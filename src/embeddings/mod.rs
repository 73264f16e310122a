//! Embeddings module - Generate semantic embeddings for log text
//!
//! Provides trait-based abstraction for embedding generation. Two backends:
//! an OpenAI-compatible HTTP provider and a local feature-hashing embedder.

mod hashing;
mod openai;

pub use hashing::HashingEmbedder;
pub use openai::{OpenAiEmbedder, FIXED_SIZE_DIMENSIONS, FIXED_SIZE_MODEL};

use crate::config::{Credentials, EmbeddingProvider, EmbeddingsSection};
use crate::error::{Error, Result};

/// Trait for embedding generation engines
pub trait EmbeddingEngine: Send {
    /// Generate embedding for a single text
    fn embed(&mut self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding for a query text
    ///
    /// Default implementation calls embed(). Providers with asymmetric
    /// query/passage encodings override this.
    fn embed_query(&mut self, text: &str) -> Result<Vec<f32>> {
        self.embed(text)
    }

    /// Generate embeddings for multiple texts, one vector per input in order
    fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimension (e.g., 1536 for text-embedding-ada-002)
    fn dimension(&self) -> usize;

    /// Model identifier recorded alongside stored vectors
    fn model_name(&self) -> &str;
}

/// Factory function to create an embedder from configuration
///
/// The OpenAI provider needs credentials; the hashing provider ignores them.
pub fn create_embedder(
    config: &EmbeddingsSection,
    credentials: Option<&Credentials>,
) -> Result<Box<dyn EmbeddingEngine>> {
    match config.provider {
        EmbeddingProvider::OpenAi => {
            let credentials = credentials.ok_or_else(|| {
                Error::Config("the openai embedding provider requires an API key".into())
            })?;
            Ok(Box::new(OpenAiEmbedder::new(config, credentials.clone())?))
        }
        EmbeddingProvider::Hashing => Ok(Box::new(HashingEmbedder::new(config.dimensions))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_credentials() {
        let config = EmbeddingsSection::default();
        let err = create_embedder(&config, None).err().unwrap();
        assert!(matches!(err, Error::Config(_)));

        let embedder = create_embedder(&config, Some(&Credentials::new("sk-test"))).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-ada-002");
        assert_eq!(embedder.dimension(), 1536);
    }

    #[test]
    fn test_hashing_needs_no_credentials() {
        let config = EmbeddingsSection {
            provider: EmbeddingProvider::Hashing,
            dimensions: 128,
            ..Default::default()
        };
        let embedder = create_embedder(&config, None).unwrap();
        assert_eq!(embedder.model_name(), "hashing-128");
        assert_eq!(embedder.dimension(), 128);
    }
}
