//! The durable, queryable vector store handle.
//!
//! Readers search an immutable snapshot behind `RwLock<Arc<Index>>`; a
//! build writes into a pending generation guarded by an async mutex
//! (single-writer discipline) and the active snapshot is swapped only
//! after `persist` succeeds, so concurrent queries never observe a
//! half-built index.

use indicatif::{ProgressBar, ProgressStyle};
use ragdb_core::config::RagdbConfig;
use ragdb_core::traits::EmbeddingService;
use ragdb_core::types::{Document, Metric, ScoredRecord, VectorRecord};
use ragdb_core::{config, Error, Result};
use ragdb_embed::Embedder;
use ragdb_ingest::Chunker;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::index::{Index, UpsertOutcome};
use crate::persist;

/// Chunks embedded per progress tick.
const EMBED_DISPLAY_BATCH: usize = 64;

/// Upsert accounting for one build pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildReport {
    pub documents: usize,
    pub chunks: usize,
    pub appended: usize,
    pub replaced: usize,
}

#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub records: usize,
    pub dim: usize,
    pub metric: Metric,
    pub generation: Option<u64>,
}

struct WriterState {
    pending: Option<Index>,
}

pub struct VectorStore {
    root: PathBuf,
    dim: usize,
    metric: Metric,
    chunker: Chunker,
    embedder: Embedder,
    active: RwLock<Arc<Index>>,
    writer: Mutex<WriterState>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("root", &self.root)
            .field("dim", &self.dim)
            .field("metric", &self.metric)
            .finish_non_exhaustive()
    }
}

impl VectorStore {
    pub fn new(config: &RagdbConfig, service: Arc<dyn EmbeddingService>) -> Result<Self> {
        if service.dim() != config.store.dim {
            return Err(Error::DimensionMismatch {
                expected: config.store.dim,
                actual: service.dim(),
            });
        }
        Ok(Self {
            root: config::expand_path(&config.store.root),
            dim: config.store.dim,
            metric: config.store.metric,
            chunker: Chunker::new(config.chunking)?,
            embedder: Embedder::from_config(&config.embedding, service),
            active: RwLock::new(Arc::new(Index::new(config.store.dim, config.store.metric))),
            writer: Mutex::new(WriterState { pending: None }),
        })
    }

    /// Chunk + embed `documents` and upsert the resulting records into a
    /// pending generation. Existing chunk identities are replaced in place,
    /// new ones appended; repeated builds over an unchanged corpus are
    /// idempotent. The active snapshot is untouched until `persist`.
    pub async fn build_from_documents(&self, documents: &[Document]) -> Result<BuildReport> {
        let mut state = self.writer.lock().await;

        let chunks = self.chunker.chunk(documents);
        let mut report = BuildReport {
            documents: documents.len(),
            chunks: chunks.len(),
            ..BuildReport::default()
        };

        // Start from the pending generation if one exists, otherwise from
        // the active snapshot, so incremental builds accumulate.
        let mut index = match state.pending.take() {
            Some(pending) => pending,
            None => (*self.snapshot()).clone(),
        };

        let by_doc: HashMap<&str, &Document> =
            documents.iter().map(|d| (d.id.as_str(), d)).collect();

        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        for window in chunks.chunks(EMBED_DISPLAY_BATCH) {
            let texts: Vec<String> = window.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed(&texts).await?;

            for (chunk, embedding) in window.iter().zip(embeddings) {
                let mut metadata = by_doc
                    .get(chunk.id.document_id.as_str())
                    .map(|d| d.metadata.clone())
                    .unwrap_or_default();
                if let Some(doc) = by_doc.get(chunk.id.document_id.as_str()) {
                    metadata.insert("source_path".to_string(), doc.source_path.clone());
                }

                let outcome = index.upsert(VectorRecord {
                    chunk_id: chunk.id.clone(),
                    embedding,
                    text: chunk.text.clone(),
                    metadata,
                })?;
                match outcome {
                    UpsertOutcome::Appended => report.appended += 1,
                    UpsertOutcome::Replaced => report.replaced += 1,
                }
            }
            pb.inc(window.len() as u64);
        }
        pb.finish_and_clear();

        info!(
            documents = report.documents,
            chunks = report.chunks,
            appended = report.appended,
            replaced = report.replaced,
            "build pass complete"
        );
        state.pending = Some(index);
        Ok(report)
    }

    /// Atomically write the pending generation (or the active snapshot if
    /// nothing is pending) and swap it in as the active index.
    pub async fn persist(&self) -> Result<u64> {
        let mut state = self.writer.lock().await;
        let index = match state.pending.take() {
            Some(pending) => pending,
            None => (*self.snapshot()).clone(),
        };

        let generation = persist::save(&index, &self.root)?;
        self.swap_active(index);
        Ok(generation)
    }

    /// Restore the most recent persisted generation. A store that has never
    /// been persisted stays empty (querying it returns no hits, which is
    /// not an error); structurally inconsistent artifacts are
    /// `CorruptStore`.
    pub async fn load(&self) -> Result<()> {
        let _state = self.writer.lock().await;
        match persist::load(&self.root, self.dim)? {
            Some(index) => {
                if index.metric() != self.metric {
                    debug!(
                        persisted = %index.metric(),
                        configured = %self.metric,
                        "using persisted metric for loaded generation"
                    );
                }
                self.swap_active(index);
            }
            None => {
                info!(root = %self.root.display(), "no persisted generation, store starts empty");
            }
        }
        Ok(())
    }

    /// Embed `text` and return the `top_k` nearest records with scores.
    /// Querying an empty or never-loaded store returns no hits, not an
    /// error, and skips the embedding call entirely.
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
        if top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be >= 1".into()));
        }
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed_one(text).await?;
        snapshot.search(&query_vec, top_k)
    }

    /// Search an already-embedded query vector against the active snapshot.
    pub fn search_vector(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        self.snapshot().search(query, top_k)
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Stable reference to the active generation; safe to search while a
    /// concurrent build/persist swaps in a newer one.
    pub fn snapshot(&self) -> Arc<Index> {
        self.active.read().expect("index lock poisoned").clone()
    }

    pub fn status(&self) -> Result<StoreStatus> {
        let snapshot = self.snapshot();
        Ok(StoreStatus {
            records: snapshot.len(),
            dim: snapshot.dim(),
            metric: snapshot.metric(),
            generation: persist::current_generation(&self.root)?,
        })
    }

    fn swap_active(&self, index: Index) {
        *self.active.write().expect("index lock poisoned") = Arc::new(index);
    }
}
