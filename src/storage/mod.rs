//! Storage layer - SQLite + USearch hybrid chunk store
//!
//! - SQLite holds the source of truth (chunk text, metadata, collection info)
//! - USearch provides cosine nearest-neighbour search via an HNSW index
//!
//! A collection is one directory; removing the directory is the only way
//! chunks are destroyed.
//!
//! # Example
//!
//! ```no_run
//! use loglens::storage::ChunkStore;
//! use std::path::Path;
//!
//! let dir = Path::new(".loglens/store/logs");
//! let store = ChunkStore::open_or_create(dir, "logs", "hashing-256", 256)?;
//! println!("{} chunks", store.count()?);
//! # Ok::<(), loglens::Error>(())
//! ```

pub mod chunks;
pub mod types;

pub use chunks::ChunkStore;
pub use types::{CollectionInfo, EmbeddedChunk, ScoredChunk, StoredChunk};
