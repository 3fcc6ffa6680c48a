//! Knowledge store: ingestion, vector index and filtered similarity search.
//!
//! The store owns the published [`VectorIndex`] behind an
//! `RwLock<Option<Arc<_>>>`. Ingestion builds a complete new index off to the
//! side (embedding in parallel with rayon), optionally writes it to the
//! SQLite snapshot, and only then swaps the pointer. Readers clone the `Arc`
//! and search without holding the lock, so a query sees either the old or
//! the new index, never a mix.

pub mod filter;
pub mod index;
pub mod ingest;
pub mod persist;

pub use filter::QueryFilter;
pub use index::{QueryHit, VectorIndex};
pub use ingest::IngestReport;
pub use persist::SnapshotStore;

use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::Document;
use crate::embedding::Embedder;
use crate::error::RetrievalError;
use index::IndexEntry;

/// Ordered query matches, closest first.
pub type QueryResult = Vec<QueryHit>;

/// Retrieval-augmented knowledge store.
pub struct KnowledgeStore {
    embedder: Arc<dyn Embedder>,
    published: RwLock<Option<Arc<VectorIndex>>>,
    snapshot: Option<SnapshotStore>,
    ingest_guard: Mutex<()>,
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("model", &self.embedder.model_name())
            .field("documents", &self.document_count())
            .field("persistent", &self.snapshot.is_some())
            .finish()
    }
}

impl KnowledgeStore {
    /// Creates an in-memory store with nothing published.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            published: RwLock::new(None),
            snapshot: None,
            ingest_guard: Mutex::new(()),
        }
    }

    /// Creates a store backed by a SQLite snapshot at `path`.
    ///
    /// A snapshot written with the same embedding model and dimension is
    /// published immediately. Snapshots from a different model are ignored
    /// and overwritten by the next ingestion.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Storage`] if the snapshot cannot be opened
    /// or read.
    pub fn open(embedder: Arc<dyn Embedder>, path: Option<&Path>) -> Result<Self, RetrievalError> {
        let mut store = Self::new(embedder);
        let Some(path) = path else {
            return Ok(store);
        };

        let snapshot = SnapshotStore::open(path)?;
        match snapshot.load()? {
            Some(index)
                if index.model() == store.embedder.model_name()
                    && index.dimensions() == store.embedder.dimensions() =>
            {
                info!(
                    path = %path.display(),
                    documents = index.len(),
                    "loaded knowledge snapshot"
                );
                *store.published.write() = Some(Arc::new(index));
            }
            Some(index) => {
                warn!(
                    path = %path.display(),
                    snapshot_model = index.model(),
                    snapshot_dimensions = index.dimensions(),
                    embedder_model = store.embedder.model_name(),
                    "ignoring knowledge snapshot from a different embedding model"
                );
            }
            None => debug!(path = %path.display(), "no knowledge snapshot yet"),
        }
        store.snapshot = Some(snapshot);
        Ok(store)
    }

    /// The embedder used for documents and queries.
    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Parses raw records and atomically replaces the index with them.
    ///
    /// Malformed records are skipped; later duplicates of an id are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError`] if embedding or snapshot writing fails. The
    /// previously published index is left untouched in that case.
    pub fn ingest(&self, records: &[Value]) -> Result<IngestReport, RetrievalError> {
        let (documents, skipped) = ingest::parse_records(records);
        let indexed = self.ingest_documents(documents)?;
        Ok(IngestReport {
            documents_indexed: indexed,
            records_seen: records.len(),
            records_skipped: skipped,
            files_read: 0,
            files_skipped: 0,
        })
    }

    /// Loads a `.json`/`.jsonl` file or directory and ingests it.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Source`] if the path is missing, or any
    /// error from [`KnowledgeStore::ingest`].
    pub fn ingest_dir(&self, path: &Path) -> Result<IngestReport, RetrievalError> {
        let loaded = ingest::load_records(path)?;
        let mut report = self.ingest(&loaded.records)?;
        report.files_read = loaded.files_read;
        report.files_skipped = loaded.files_skipped;
        info!(
            path = %path.display(),
            documents = report.documents_indexed,
            skipped_records = report.records_skipped,
            files = report.files_read,
            "knowledge ingestion complete"
        );
        Ok(report)
    }

    /// Embeds already-parsed documents and publishes them as the new index.
    ///
    /// Documents must have unique ids; duplicates after the first are
    /// dropped.
    ///
    /// # Errors
    ///
    /// See [`KnowledgeStore::ingest`].
    pub fn ingest_documents(&self, documents: Vec<Document>) -> Result<usize, RetrievalError> {
        // One writer at a time so snapshot and published index stay in step.
        let _guard = self.ingest_guard.lock();

        let mut seen = std::collections::HashSet::new();
        let documents: Vec<Document> = documents
            .into_iter()
            .filter(|d| !d.text.trim().is_empty() && seen.insert(d.id.clone()))
            .collect();

        let vectors = self.embed_all(&documents)?;
        let entries: Vec<IndexEntry> = documents
            .into_iter()
            .zip(vectors)
            .map(|(document, vector)| IndexEntry { document, vector })
            .collect();

        let index = VectorIndex::new(
            entries,
            self.embedder.model_name().to_string(),
            self.embedder.dimensions(),
        );
        if let Some(snapshot) = &self.snapshot {
            snapshot.save(&index)?;
        }

        let count = index.len();
        *self.published.write() = Some(Arc::new(index));
        debug!(documents = count, "published knowledge index");
        Ok(count)
    }

    fn embed_all(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let vectors = if self.embedder.parallel_friendly() {
            texts
                .par_iter()
                .map(|t| self.embedder.embed(t))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            self.embedder.embed_batch(&texts)?
        };

        if vectors.len() != documents.len() {
            return Err(RetrievalError::Embedding {
                message: format!(
                    "embedder returned {} vectors for {} documents",
                    vectors.len(),
                    documents.len()
                ),
            });
        }
        let expected = self.embedder.dimensions();
        if let Some(bad) = vectors.iter().position(|v| v.len() != expected) {
            return Err(RetrievalError::Embedding {
                message: format!(
                    "vector for '{}' has {} dimensions, expected {expected}",
                    documents[bad].id,
                    vectors[bad].len()
                ),
            });
        }
        Ok(vectors)
    }

    /// Returns up to `n_results` documents closest to `text` that satisfy
    /// `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::IndexUnavailable`] before the first
    /// successful ingestion, or [`RetrievalError::Embedding`] if the query
    /// cannot be embedded.
    pub fn query(
        &self,
        text: &str,
        n_results: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<QueryResult, RetrievalError> {
        let index = self.current().ok_or(RetrievalError::IndexUnavailable)?;
        if index.is_empty() || n_results == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(text)?;
        let default_filter = QueryFilter::default();
        let hits = index.search(&vector, n_results, filter.unwrap_or(&default_filter));
        debug!(query = text, hits = hits.len(), "knowledge query");
        Ok(hits)
    }

    /// Whether an index has been published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.published.read().is_some()
    }

    /// Number of published documents (zero when not ready).
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.current().map_or(0, |i| i.len())
    }

    /// Published documents in id order.
    #[must_use]
    pub fn documents(&self) -> Vec<Document> {
        self.current()
            .map(|i| i.documents().cloned().collect())
            .unwrap_or_default()
    }

    fn current(&self) -> Option<Arc<VectorIndex>> {
        self.published.read().clone()
    }
}
