//! Feature-hashing embedder - deterministic, offline
//!
//! Each lower-cased alphanumeric token is hashed with SHA-256; the digest
//! picks a bucket and a sign. The bucket counts are L2-normalised so cosine
//! similarity reflects shared vocabulary. Not semantic, but stable across
//! runs and machines, which makes it usable without network access.

use sha2::{Digest, Sha256};

use super::EmbeddingEngine;
use crate::error::Result;

pub struct HashingEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_name: format!("hashing-{}", dimension),
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            // Token-free text still needs a valid direction for cosine search
            vector[0] = 1.0;
            return vector;
        }

        for x in vector.iter_mut() {
            *x /= norm;
        }
        vector
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl EmbeddingEngine for HashingEmbedder {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic_and_normalised() {
        let mut embedder = HashingEmbedder::new(64);
        let a = embedder.embed("ERROR timeout contacting db").unwrap();
        let b = embedder.embed("error TIMEOUT contacting db").unwrap();

        assert_eq!(a.len(), 64);
        assert_eq!(a, b, "tokenisation is case-insensitive");
        assert_relative_eq!(dot(&a, &a), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_shared_tokens_score_higher() {
        let mut embedder = HashingEmbedder::new(256);
        let query = embedder.embed_query("timeout error").unwrap();
        let close = embedder.embed(r#"{"level":"error","msg":"timeout"}"#).unwrap();
        let far = embedder.embed(r#"{"status":"healthy","uptime":"3d"}"#).unwrap();

        assert!(dot(&query, &close) > dot(&query, &far));
    }

    #[test]
    fn test_empty_text_has_unit_vector() {
        let mut embedder = HashingEmbedder::new(8);
        let v = embedder.embed("{}").unwrap();
        assert_relative_eq!(dot(&v, &v), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_batch_matches_single() {
        let mut embedder = HashingEmbedder::new(32);
        let texts = vec!["one".to_string(), "two".to_string()];
        let batch = embedder.embed_batch(&texts).unwrap();
        assert_eq!(batch[0], embedder.embed("one").unwrap());
        assert_eq!(batch[1], embedder.embed("two").unwrap());
    }
}
