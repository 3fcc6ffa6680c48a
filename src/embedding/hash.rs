//! Deterministic feature-hashing embedder.
//!
//! Words, word prefixes and adjacent word pairs are hashed (FNV-1a) into a
//! signed bucket of a fixed-size vector which is then L2-normalised. Texts
//! that share vocabulary land close together in cosine space, which is
//! enough for keyword-heavy catalogue and FAQ lookups without a model.

use unicode_segmentation::UnicodeSegmentation;

use super::Embedder;
use crate::error::RetrievalError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Prefix length used to fold simple inflections ("returns" / "returned").
const PREFIX_CHARS: usize = 5;

/// Feature-hashing embedder.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
    model_name: String,
}

impl HashEmbedder {
    /// Creates an embedder producing `dimensions`-length vectors.
    ///
    /// A zero dimension is bumped to one.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model_name: format!("hash-fnv1a-{dimensions}"),
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let mut vector = vec![0.0_f32; self.dimensions];
        let words: Vec<String> = text.unicode_words().map(str::to_lowercase).collect();

        for word in &words {
            self.add_feature(&mut vector, word, 1.0);
            if word.chars().count() > PREFIX_CHARS {
                let prefix: String = word.chars().take(PREFIX_CHARS).collect();
                self.add_feature(&mut vector, &format!("p:{prefix}"), 0.5);
            }
        }
        for pair in words.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_deterministic() {
        let e = HashEmbedder::new(64);
        let a = e.embed("leather armchair").unwrap_or_default();
        let b = e.embed("leather armchair").unwrap_or_default();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_normalised() {
        let e = HashEmbedder::new(128);
        let v = e.embed("What is your return policy?").unwrap_or_default();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let e = HashEmbedder::new(16);
        let v = e.embed("   ").unwrap_or_default();
        assert!(v.iter().all(|x| x.abs() < f32::EPSILON));
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let e = HashEmbedder::new(384);
        let query = e.embed("return policy").unwrap_or_default();
        let faq = e
            .embed("Question: What is the return policy?. Answer: 30 days")
            .unwrap_or_default();
        let product = e
            .embed("Product Name: Vintage Bookshelf. Description: Industrial steel shelving")
            .unwrap_or_default();
        assert!(cosine_similarity(&query, &faq) > cosine_similarity(&query, &product));
    }

    #[test]
    fn test_case_insensitive() {
        let e = HashEmbedder::new(64);
        assert_eq!(
            e.embed("Jute Rug").unwrap_or_default(),
            e.embed("jute rug").unwrap_or_default()
        );
    }

    #[test]
    fn test_model_name_encodes_dimensions() {
        assert_eq!(HashEmbedder::new(384).model_name(), "hash-fnv1a-384");
        assert_eq!(HashEmbedder::new(0).dimensions(), 1);
    }
}
