//! Text embedding providers.
//!
//! The knowledge store depends only on the [`Embedder`] trait. Two
//! implementations ship with the crate:
//!
//! - [`HashEmbedder`]: deterministic feature hashing, always available and
//!   used in tests.
//! - `FastEmbedder`: all-MiniLM-L6-v2 through `fastembed`, behind the
//!   `fastembed-embeddings` feature.

mod hash;

#[cfg(feature = "fastembed-embeddings")]
mod fastembed;

#[cfg(feature = "fastembed-embeddings")]
pub use self::fastembed::FastEmbedder;
pub use hash::HashEmbedder;

use std::sync::Arc;

use crate::error::RetrievalError;

/// Default embedding dimensions (matches all-MiniLM-L6-v2).
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Maps text to fixed-length vectors.
///
/// Implementations must be deterministic for a given model and must always
/// return vectors of [`Embedder::dimensions`] length.
pub trait Embedder: Send + Sync {
    /// Embeds a single text.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Embedding`] if the model fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;

    /// Embeds many texts, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Embedding`] if any text fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Vector length.
    fn dimensions(&self) -> usize;

    /// Model identifier, stored alongside persisted vectors.
    fn model_name(&self) -> &str;

    /// Whether per-text calls are cheap enough to fan out across threads.
    ///
    /// Batched models return `false` and get one `embed_batch` call instead.
    fn parallel_friendly(&self) -> bool {
        true
    }
}

/// Creates the best available embedder.
///
/// With `fastembed-embeddings` enabled the ONNX model is tried first and the
/// hash embedder is used if it cannot be loaded.
#[must_use]
pub fn create_embedder() -> Arc<dyn Embedder> {
    #[cfg(feature = "fastembed-embeddings")]
    {
        match FastEmbedder::new() {
            Ok(embedder) => return Arc::new(embedder),
            Err(e) => {
                tracing::warn!(error = %e, "fastembed unavailable, using hash embeddings");
            }
        }
    }
    Arc::new(HashEmbedder::new(DEFAULT_DIMENSIONS))
}

/// Cosine similarity of two vectors; zero when either has no magnitude or
/// the lengths differ.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine distance `1 - cos(a, b)`, in `[0, 2]`.
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    (1.0 - cosine_similarity(a, b)).clamp(0.0, 2.0)
}
