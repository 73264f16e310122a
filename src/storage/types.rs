//! Domain types for the chunk store
//!
//! Storage-agnostic: the store wrapper handles (de)serialization.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::normalize::ChunkMetadata;

/// A chunk ready to be written: text, metadata and its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub vector: Vec<f32>,
}

/// A chunk as read back from the store (vectors are not hydrated)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredChunk {
    /// SQLite row id, also the key in the vector index
    pub id: i64,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Ingest call that wrote this chunk
    pub batch_id: Uuid,
    pub ingested_at: DateTime<Utc>,
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: StoredChunk,
    /// Cosine similarity to the query (1.0 = identical direction)
    pub similarity: f32,
}

/// Collection-level metadata, fixed at creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    /// Embedding model identifier the vectors were produced with
    pub model: String,
    pub dimension: usize,
    pub created_at: DateTime<Utc>,
}
