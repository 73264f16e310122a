//! Chunk storage using SQLite + USearch
//!
//! Files inside a collection directory:
//! - `chunks.db` - chunk rows plus a single-row `collection` table
//! - `chunks.usearch` - vector index keyed by chunk row id

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::normalize::ChunkMetadata;
use crate::paths;
use crate::storage::types::{CollectionInfo, EmbeddedChunk, ScoredChunk, StoredChunk};

/// Initial index capacity for a new collection
const INITIAL_CAPACITY: usize = 1024;

/// Directory-backed chunk collection
pub struct ChunkStore {
    vectors: Index,
    db: Connection,
    index_path: PathBuf,
    info: CollectionInfo,
}

impl ChunkStore {
    /// Whether a collection has been created at `dir`
    pub fn exists(dir: &Path) -> bool {
        paths::collection::db_path(dir).exists()
    }

    /// Open an existing collection
    ///
    /// Fails with [`Error::StoreNotFound`] if nothing was ever ingested here.
    pub fn open(dir: &Path) -> Result<Self> {
        if !Self::exists(dir) {
            return Err(Error::StoreNotFound {
                path: dir.to_path_buf(),
            });
        }

        let db = Connection::open(paths::collection::db_path(dir))?;
        Self::init_schema(&db)?;

        let info = Self::load_info(&db)?.ok_or_else(|| {
            Error::store(format!(
                "collection metadata missing in {}",
                paths::collection::db_path(dir).display()
            ))
        })?;

        let index_path = paths::collection::index_path(dir);
        let vectors = new_index(info.dimension)?;

        if index_path.exists() {
            vectors
                .load(path_str(&index_path)?)
                .map_err(|e| Error::store(format!("failed to load index: {}", e)))?;
        } else if count_rows(&db)? > 0 {
            return Err(Error::store(format!(
                "vector index {} is missing; reset the collection and ingest again",
                index_path.display()
            )));
        }

        log::debug!(
            "opened collection {} ({} vectors, model {})",
            info.name,
            vectors.size(),
            info.model
        );

        Ok(Self {
            vectors,
            db,
            index_path,
            info,
        })
    }

    /// Create a new collection, or open it if it already exists
    ///
    /// An existing collection built with a different model or dimension is
    /// rejected with [`Error::ModelMismatch`].
    pub fn open_or_create(dir: &Path, name: &str, model: &str, dimension: usize) -> Result<Self> {
        if Self::exists(dir) {
            let store = Self::open(dir)?;
            store.ensure_model(model, dimension)?;
            return Ok(store);
        }

        std::fs::create_dir_all(dir)?;
        let db = Connection::open(paths::collection::db_path(dir))?;
        Self::init_schema(&db)?;

        let info = CollectionInfo {
            name: name.to_string(),
            model: model.to_string(),
            dimension,
            created_at: Utc::now(),
        };
        db.execute(
            "INSERT INTO collection (id, name, model, dimension, created_at)
             VALUES (1, ?1, ?2, ?3, ?4)",
            params![
                info.name,
                info.model,
                info.dimension as i64,
                info.created_at.to_rfc3339()
            ],
        )?;

        log::info!(
            "created collection {} at {} ({}, {} dims)",
            name,
            dir.display(),
            model,
            dimension
        );

        Ok(Self {
            vectors: new_index(dimension)?,
            db,
            index_path: paths::collection::index_path(dir),
            info,
        })
    }

    /// Delete a collection directory. Returns whether anything was removed.
    pub fn destroy(dir: &Path) -> Result<bool> {
        if !dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(dir)?;
        log::info!("removed collection at {}", dir.display());
        Ok(true)
    }

    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS collection (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                name TEXT NOT NULL,
                model TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL,
                batch_id TEXT NOT NULL,
                ingested_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn load_info(db: &Connection) -> Result<Option<CollectionInfo>> {
        let row = db
            .query_row(
                "SELECT name, model, dimension, created_at FROM collection WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(name, model, dimension, created_at)| -> Result<CollectionInfo> {
            Ok(CollectionInfo {
                name,
                model,
                dimension: dimension as usize,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .transpose()
    }

    pub fn info(&self) -> &CollectionInfo {
        &self.info
    }

    /// Reject an embedder that does not match the collection
    pub fn ensure_model(&self, model: &str, dimension: usize) -> Result<()> {
        if self.info.model != model || self.info.dimension != dimension {
            return Err(Error::ModelMismatch {
                stored: format!("{} ({} dims)", self.info.model, self.info.dimension),
                configured: format!("{} ({} dims)", model, dimension),
            });
        }
        Ok(())
    }

    /// Append chunks to the collection
    ///
    /// Rows and vectors are written together: the SQLite transaction only
    /// commits after the index has been saved. If indexing, saving or the
    /// commit fails, the new vectors are removed and the index is saved again.
    pub fn add(&mut self, batch_id: Uuid, chunks: &[EmbeddedChunk]) -> Result<Vec<i64>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        for chunk in chunks {
            if chunk.vector.len() != self.info.dimension {
                return Err(Error::store(format!(
                    "vector for record {} has {} dims, collection expects {}",
                    chunk.metadata.index,
                    chunk.vector.len(),
                    self.info.dimension
                )));
            }
        }

        let needed = self.vectors.size() + chunks.len();
        if needed > self.vectors.capacity() {
            let capacity = needed.max(self.vectors.capacity() * 2).max(INITIAL_CAPACITY);
            self.vectors
                .reserve(capacity)
                .map_err(|e| Error::store(format!("failed to reserve index capacity: {}", e)))?;
        }

        let ingested_at = Utc::now().to_rfc3339();
        let batch = batch_id.to_string();
        let tx = self.db.transaction()?;

        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            tx.execute(
                "INSERT INTO chunks (text, metadata, batch_id, ingested_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    chunk.text,
                    serde_json::to_string(&chunk.metadata)?,
                    batch,
                    ingested_at
                ],
            )?;
            ids.push(tx.last_insert_rowid());
        }

        let written = ids
            .iter()
            .zip(chunks)
            .try_for_each(|(id, chunk)| self.vectors.add(*id as u64, &chunk.vector))
            .map_err(|e| Error::store(format!("failed to add vector: {}", e)))
            .and_then(|_| {
                self.vectors
                    .save(path_str(&self.index_path)?)
                    .map_err(|e| Error::store(format!("failed to save index: {}", e)))
            })
            .and_then(|_| tx.commit().map_err(Error::from));

        if let Err(e) = written {
            for id in &ids {
                let _ = self.vectors.remove(*id as u64);
            }
            // The saved index may already hold the rolled-back rows
            if self.index_path.exists() {
                if let Err(save_err) = path_str(&self.index_path)
                    .and_then(|path| self.vectors.save(path).map_err(Error::store))
                {
                    log::warn!("failed to restore index after rollback: {}", save_err);
                }
            }
            return Err(e);
        }

        Ok(ids)
    }

    /// Nearest chunks to `query`, most similar first
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.info.dimension {
            return Err(Error::store(format!(
                "query vector has {} dims, collection expects {}",
                query.len(),
                self.info.dimension
            )));
        }

        let count = k.min(self.vectors.size());
        if count == 0 {
            return Ok(Vec::new());
        }

        let matches = self
            .vectors
            .search(query, count)
            .map_err(|e| Error::store(format!("failed to search index: {}", e)))?;

        let mut results = Vec::with_capacity(matches.keys.len());
        for (key, distance) in matches.keys.iter().zip(matches.distances.iter()) {
            if let Some(chunk) = self.load_by_id(*key as i64)? {
                // Cosine distance to similarity
                results.push(ScoredChunk {
                    chunk,
                    similarity: 1.0 - distance,
                });
            }
        }

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Ok(results)
    }

    fn load_by_id(&self, id: i64) -> Result<Option<StoredChunk>> {
        let row = self
            .db
            .query_row(
                "SELECT id, text, metadata, batch_id, ingested_at FROM chunks WHERE id = ?1",
                params![id],
                read_row,
            )
            .optional()?;

        row.map(hydrate).transpose()
    }

    /// Every chunk in insertion order
    pub fn all(&self) -> Result<Vec<StoredChunk>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, text, metadata, batch_id, ingested_at FROM chunks ORDER BY id")?;

        let rows = stmt
            .query_map([], read_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(hydrate).collect()
    }

    /// Number of chunks in the collection
    pub fn count(&self) -> Result<usize> {
        count_rows(&self.db)
    }
}

/// (id, text, metadata, batch_id, ingested_at)
type ChunkRow = (i64, String, String, String, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChunkRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn hydrate((id, text, metadata, batch_id, ingested_at): ChunkRow) -> Result<StoredChunk> {
    let metadata: ChunkMetadata = serde_json::from_str(&metadata)?;
    let batch_id = Uuid::parse_str(&batch_id)
        .map_err(|e| Error::store(format!("corrupt batch id on chunk {}: {}", id, e)))?;

    Ok(StoredChunk {
        id,
        text,
        metadata,
        batch_id,
        ingested_at: parse_timestamp(&ingested_at)?,
    })
}

fn count_rows(db: &Connection) -> Result<usize> {
    let count: i64 = db.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
    Ok(count as usize)
}

fn new_index(dimension: usize) -> Result<Index> {
    let options = IndexOptions {
        dimensions: dimension,
        metric: MetricKind::Cos,
        quantization: ScalarKind::F32,
        ..Default::default()
    };

    Index::new(&options).map_err(|e| Error::store(format!("failed to create index: {}", e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::store(format!("corrupt timestamp {:?}: {}", value, e)))
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::store(format!("non UTF-8 path: {}", path.display())))
}
