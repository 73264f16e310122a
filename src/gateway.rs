//! Embedding/store gateway
//!
//! Owns the embedder and the collection handle. The handle is opened on
//! first use and kept for the gateway's lifetime; an ingest that creates the
//! collection installs the new handle. `close` drops it, `reset` drops it and
//! deletes the collection.

use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::{Config, Credentials};
use crate::embeddings::{create_embedder, EmbeddingEngine};
use crate::error::{Error, Result};
use crate::normalize::{self, NormalizedRecord};
use crate::storage::{ChunkStore, CollectionInfo, EmbeddedChunk, ScoredChunk};

/// Outcome of a successful ingest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub batch_id: Uuid,
    /// Records written by this call
    pub stored: usize,
    /// Chunks in the collection afterwards
    pub total_in_collection: usize,
}

/// Ranked search hits for one query, most similar first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub query: String,
    pub k: usize,
    pub chunks: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.chunks.iter()
    }
}

/// Collection status for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub chunks: usize,
    pub collection: Option<CollectionInfo>,
    /// Model identifier and dimension of the configured embedder
    pub configured_model: String,
    pub configured_dimension: usize,
}

impl StoreStatus {
    /// Collection exists but was built with another embedding model
    pub fn model_mismatch(&self) -> bool {
        self.collection
            .as_ref()
            .is_some_and(|info| {
                info.model != self.configured_model || info.dimension != self.configured_dimension
            })
    }
}

pub struct StoreGateway {
    embedder: Box<dyn EmbeddingEngine>,
    dir: PathBuf,
    collection: String,
    batch_size: usize,
    store: Option<ChunkStore>,
}

impl StoreGateway {
    /// Create a gateway around an existing embedder
    pub fn new(config: &Config, embedder: Box<dyn EmbeddingEngine>) -> Self {
        Self {
            embedder,
            dir: config.collection_dir(),
            collection: config.store.collection.clone(),
            batch_size: config.embeddings.batch_size.max(1),
            store: None,
        }
    }

    /// Create a gateway with the embedder named in config
    pub fn from_config(config: &Config, credentials: Option<&Credentials>) -> Result<Self> {
        let embedder = create_embedder(&config.embeddings, credentials)?;
        Ok(Self::new(config, embedder))
    }

    pub fn collection_dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Decode, normalize and ingest a JSON array
    ///
    /// Shape and JSON errors are raised before the collection is touched.
    pub fn ingest_json(&mut self, text: &str) -> Result<IngestReport> {
        let records = normalize::parse_records(text)?;
        self.ingest(&records)
    }

    /// Embed and append records to the collection
    ///
    /// Works batch by batch: embed, then store. A failure stops the ingest
    /// and reports how many records were already written. A collection this
    /// call created is removed again when nothing was stored, so a failed
    /// first ingest leaves no store behind.
    pub fn ingest(&mut self, records: &[NormalizedRecord]) -> Result<IngestReport> {
        let created = self.store.is_none() && !ChunkStore::exists(&self.dir);
        self.ensure_open(true)?;

        let batch_id = Uuid::new_v4();

        log::info!(
            "ingesting {} records into {} (batch {})",
            records.len(),
            self.dir.display(),
            batch_id
        );

        let stored = match self.write_batches(batch_id, records) {
            Ok(stored) => stored,
            Err((stored, source)) => {
                if created && stored == 0 {
                    self.discard_collection();
                }
                return Err(abort(stored, source));
            }
        };

        let total_in_collection = match self.store.as_ref() {
            Some(store) => store.count()?,
            None => stored,
        };

        Ok(IngestReport {
            batch_id,
            stored,
            total_in_collection,
        })
    }

    /// Returns the number of records written, or that number with the error
    fn write_batches(
        &mut self,
        batch_id: Uuid,
        records: &[NormalizedRecord],
    ) -> std::result::Result<usize, (usize, Error)> {
        let mut stored = 0;

        for batch in records.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();

            let vectors = self
                .embedder
                .embed_batch(&texts)
                .map_err(|e| (stored, e))?;

            if vectors.len() != batch.len() {
                return Err((
                    stored,
                    Error::store(format!(
                        "embedder returned {} vectors for {} records",
                        vectors.len(),
                        batch.len()
                    )),
                ));
            }

            let chunks: Vec<EmbeddedChunk> = batch
                .iter()
                .zip(vectors)
                .map(|(record, vector)| EmbeddedChunk {
                    text: record.text.clone(),
                    metadata: record.metadata,
                    vector,
                })
                .collect();

            let store = self
                .store
                .as_mut()
                .ok_or_else(|| (stored, not_found(&self.dir)))?;
            store.add(batch_id, &chunks).map_err(|e| (stored, e))?;

            stored += chunks.len();
            log::debug!("stored {}/{} records", stored, records.len());
        }

        Ok(stored)
    }

    fn discard_collection(&mut self) {
        self.close();
        if let Err(e) = ChunkStore::destroy(&self.dir) {
            log::warn!(
                "failed to remove empty collection {}: {}",
                self.dir.display(),
                e
            );
        }
    }

    /// Up to `k` chunks most similar to `query`, most similar first
    ///
    /// Fails with [`Error::StoreNotFound`] when nothing has been ingested;
    /// an existing collection without hits gives an empty result.
    pub fn search(&mut self, query: &str, k: usize) -> Result<RetrievalResult> {
        self.ensure_open(false)?;

        let chunks = if k == 0 {
            Vec::new()
        } else {
            let vector = self.embedder.embed_query(query)?;
            let store = self.store.as_ref().ok_or_else(|| not_found(&self.dir))?;
            store.query(&vector, k)?
        };

        log::info!("search returned {} of k={} chunks", chunks.len(), k);

        Ok(RetrievalResult {
            query: query.to_string(),
            k,
            chunks,
        })
    }

    /// What is on disk, reported even when the configured model differs
    pub fn status(&mut self) -> Result<StoreStatus> {
        let configured_model = self.embedder.model_name().to_string();
        let configured_dimension = self.embedder.dimension();

        let opened = match self.ensure_open(false) {
            Ok(()) => None,
            Err(Error::StoreNotFound { .. }) => {
                return Ok(StoreStatus {
                    path: self.dir.clone(),
                    exists: false,
                    chunks: 0,
                    collection: None,
                    configured_model,
                    configured_dimension,
                })
            }
            Err(Error::ModelMismatch { .. }) => Some(ChunkStore::open(&self.dir)?),
            Err(e) => return Err(e),
        };

        let store = match opened.as_ref().or(self.store.as_ref()) {
            Some(store) => store,
            None => return Err(not_found(&self.dir)),
        };

        Ok(StoreStatus {
            path: self.dir.clone(),
            exists: true,
            chunks: store.count()?,
            collection: Some(store.info().clone()),
            configured_model,
            configured_dimension,
        })
    }

    /// Delete the collection. Returns whether anything was removed.
    pub fn reset(&mut self) -> Result<bool> {
        self.close();
        ChunkStore::destroy(&self.dir)
    }

    /// Drop the open collection handle
    pub fn close(&mut self) {
        if self.store.take().is_some() {
            log::debug!("closed collection {}", self.dir.display());
        }
    }

    fn ensure_open(&mut self, create: bool) -> Result<()> {
        if self.store.is_some() {
            return Ok(());
        }

        let model = self.embedder.model_name().to_string();
        let dimension = self.embedder.dimension();

        let store = if create {
            ChunkStore::open_or_create(&self.dir, &self.collection, &model, dimension)?
        } else {
            let store = ChunkStore::open(&self.dir)?;
            store.ensure_model(&model, dimension)?;
            store
        };

        self.store = Some(store);
        Ok(())
    }
}

fn abort(stored: usize, source: Error) -> Error {
    log::warn!("ingest aborted after {} records: {}", stored, source);
    Error::IngestAborted {
        stored,
        source: Box::new(source),
    }
}

fn not_found(dir: &Path) -> Error {
    Error::StoreNotFound {
        path: dir.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use tempfile::TempDir;

    fn gateway(temp: &TempDir) -> StoreGateway {
        let mut config = Config::default();
        config.store.path = temp.path().to_string_lossy().to_string();
        config.embeddings.batch_size = 2;
        StoreGateway::new(&config, Box::new(HashingEmbedder::new(64)))
    }

    /// Embedder that fails on the nth batch
    struct FailingEmbedder {
        inner: HashingEmbedder,
        fail_on_batch: usize,
        batches: usize,
    }

    impl EmbeddingEngine for FailingEmbedder {
        fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
            self.inner.embed(text)
        }

        fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batches += 1;
            if self.batches == self.fail_on_batch {
                return Err(crate::error::ProviderError::Timeout("embeddings".into()).into());
            }
            self.inner.embed_batch(texts)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }
    }

    #[test]
    fn test_ingest_is_additive() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let mut gateway = gateway(&temp);

        let first = gateway.ingest_json(r#"[{"a":1},{"a":2},{"a":3}]"#)?;
        assert_eq!(first.stored, 3);
        assert_eq!(first.total_in_collection, 3);

        let second = gateway.ingest_json(r#"[{"b":1}]"#)?;
        assert_eq!(second.stored, 1);
        assert_eq!(second.total_in_collection, 4);
        assert_ne!(first.batch_id, second.batch_id);
        Ok(())
    }

    #[test]
    fn test_shape_error_leaves_store_absent() {
        let temp = TempDir::new().unwrap();
        let mut gateway = gateway(&temp);

        let err = gateway.ingest_json(r#"{"level":"INFO"}"#).unwrap_err();
        assert!(matches!(err, Error::Shape { .. }));
        assert!(!ChunkStore::exists(gateway.collection_dir()));

        let err = gateway.search("anything", 3).unwrap_err();
        assert!(matches!(err, Error::StoreNotFound { .. }));
    }

    #[test]
    fn test_partial_failure_reports_progress() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.store.path = temp.path().to_string_lossy().to_string();
        config.embeddings.batch_size = 2;

        let embedder = FailingEmbedder {
            inner: HashingEmbedder::new(32),
            fail_on_batch: 2,
            batches: 0,
        };
        let mut gateway = StoreGateway::new(&config, Box::new(embedder));

        let err = gateway
            .ingest_json(r#"[{"n":0},{"n":1},{"n":2},{"n":3}]"#)
            .unwrap_err();
        match err {
            Error::IngestAborted { stored, source } => {
                assert_eq!(stored, 2);
                assert!(matches!(*source, Error::Provider(_)));
            }
            other => panic!("expected IngestAborted, got {:?}", other),
        }

        assert_eq!(gateway.status()?.chunks, 2);
        Ok(())
    }

    #[test]
    fn test_failed_first_ingest_leaves_no_store() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.store.path = temp.path().to_string_lossy().to_string();

        let embedder = FailingEmbedder {
            inner: HashingEmbedder::new(32),
            fail_on_batch: 1,
            batches: 0,
        };
        let mut gateway = StoreGateway::new(&config, Box::new(embedder));

        let err = gateway.ingest_json(r#"[{"a":1}]"#).unwrap_err();
        assert!(matches!(err, Error::IngestAborted { stored: 0, .. }));
        assert!(!ChunkStore::exists(gateway.collection_dir()));

        let mut fresh = StoreGateway::new(&config, Box::new(HashingEmbedder::new(64)));
        assert!(matches!(
            fresh.search("a", 0),
            Err(Error::StoreNotFound { .. })
        ));
    }

    #[test]
    fn test_failed_ingest_keeps_existing_store() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.store.path = temp.path().to_string_lossy().to_string();

        let mut seeded = StoreGateway::new(&config, Box::new(HashingEmbedder::new(32)));
        seeded.ingest_json("[]")?;
        seeded.close();

        let embedder = FailingEmbedder {
            inner: HashingEmbedder::new(32),
            fail_on_batch: 1,
            batches: 0,
        };
        let mut gateway = StoreGateway::new(&config, Box::new(embedder));
        assert!(gateway.ingest_json(r#"[{"a":1}]"#).is_err());

        assert!(ChunkStore::exists(gateway.collection_dir()));
        assert!(gateway.search("a", 1)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_search_after_empty_ingest_is_empty_not_missing() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let mut gateway = gateway(&temp);

        gateway.ingest_json("[]")?;
        let result = gateway.search("errors", 5)?;
        assert!(result.is_empty());
        Ok(())
    }

    #[test]
    fn test_status_and_reset() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let mut gateway = gateway(&temp);

        let status = gateway.status()?;
        assert!(!status.exists);

        gateway.ingest_json(r#"[{"x":1},{"x":2}]"#)?;
        let status = gateway.status()?;
        assert!(status.exists);
        assert_eq!(status.chunks, 2);
        assert!(!status.model_mismatch());
        assert_eq!(status.collection.unwrap().model, "hashing-64");

        assert!(gateway.reset()?);
        assert!(!gateway.status()?.exists);
        assert!(matches!(
            gateway.search("x", 1),
            Err(Error::StoreNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_model_mismatch_on_search() -> Result<()> {
        let temp = TempDir::new().unwrap();
        gateway(&temp).ingest_json(r#"[{"x":1}]"#)?;

        let mut config = Config::default();
        config.store.path = temp.path().to_string_lossy().to_string();
        let mut other = StoreGateway::new(&config, Box::new(HashingEmbedder::new(128)));

        let err = other.search("x", 1).unwrap_err();
        assert!(matches!(err, Error::ModelMismatch { .. }));

        let status = other.status()?;
        assert!(status.exists);
        assert_eq!(status.chunks, 1);
        assert_eq!(status.configured_model, "hashing-128");
        assert!(status.model_mismatch());
        Ok(())
    }
}
