//! ONNX embeddings through `fastembed` (all-MiniLM-L6-v2).

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::{DEFAULT_DIMENSIONS, Embedder};
use crate::error::RetrievalError;

const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Semantic embedder backed by a local ONNX model.
///
/// The model session needs exclusive access per call, so it sits behind a
/// mutex and callers should prefer [`Embedder::embed_batch`].
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedder {
    /// Loads (downloading on first use) the model.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Embedding`] if the model cannot be loaded.
    pub fn new() -> Result<Self, RetrievalError> {
        let options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        let model = TextEmbedding::try_new(options).map_err(|e| RetrievalError::Embedding {
            message: format!("failed to load {MODEL_NAME}: {e}"),
        })?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl Embedder for FastEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| RetrievalError::Embedding {
                message: "model returned no vectors".to_string(),
            })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self.model.lock();
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| RetrievalError::Embedding {
                message: e.to_string(),
            })
    }

    fn dimensions(&self) -> usize {
        DEFAULT_DIMENSIONS
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn parallel_friendly(&self) -> bool {
        false
    }
}
