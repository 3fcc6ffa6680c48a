//! Immutable in-memory vector index.
//!
//! An index is built once from a set of embedded documents and never
//! mutated afterwards; re-ingestion builds a fresh index and swaps it in.

use std::cmp::Ordering;

use serde::Serialize;

use super::filter::QueryFilter;
use crate::core::{Document, DocumentMetadata};
use crate::embedding::cosine_distance;

/// A document with its embedding.
#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
    pub(crate) document: Document,
    pub(crate) vector: Vec<f32>,
}

/// One scored match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHit {
    /// Document id.
    pub id: String,
    /// Document text.
    pub text: String,
    /// Document metadata.
    pub metadata: DocumentMetadata,
    /// Cosine distance to the query, lower is closer.
    pub distance: f32,
}

/// Vectors for one embedding model.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    model: String,
    dimensions: usize,
}

impl VectorIndex {
    pub(crate) fn new(mut entries: Vec<IndexEntry>, model: String, dimensions: usize) -> Self {
        entries.sort_by(|a, b| a.document.id.cmp(&b.document.id));
        Self {
            entries,
            model,
            dimensions,
        }
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding model the vectors came from.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Vector length.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub(crate) fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Documents in id order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|e| &e.document)
    }

    /// Returns up to `n_results` filtered matches, closest first, ties
    /// broken by id.
    #[must_use]
    pub fn search(&self, query: &[f32], n_results: usize, filter: &QueryFilter) -> Vec<QueryHit> {
        if n_results == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .filter(|e| filter.matches(&e.document))
            .map(|e| (cosine_distance(query, &e.vector), e))
            .collect();

        scored.sort_by(|(da, a), (db, b)| {
            da.partial_cmp(db)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        scored.truncate(n_results);

        scored
            .into_iter()
            .map(|(distance, e)| QueryHit {
                id: e.document.id.clone(),
                text: e.document.text.clone(),
                metadata: e.document.metadata.clone(),
                distance,
            })
            .collect()
    }
}
