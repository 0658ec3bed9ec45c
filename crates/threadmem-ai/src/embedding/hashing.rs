//! Deterministic hash-based embedder.
//!
//! Maps text to a stable unit vector derived from an FNV hash of its bytes.
//! Identical texts always embed identically; unrelated texts land nearly
//! orthogonal. Not suitable for real semantic search - meant for tests and
//! offline development, where it is selected through the registry name
//! `hashing`.

use async_trait::async_trait;

use super::provider::{DEFAULT_EMBEDDING_DIM, EmbeddingProvider};
use crate::error::Result;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a hashing embedder producing vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be positive");
        Self { dimension }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut seed = FNV_OFFSET;
        for &byte in text.as_bytes() {
            seed ^= byte as u64;
            seed = seed.wrapping_mul(FNV_PRIME);
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for (i, value) in embedding.iter_mut().enumerate() {
            let mixed = seed ^ (i as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
            let mixed = mixed.wrapping_mul(0xff51_afd7_ed55_8ccd);
            *value = (mixed as i64 as f32) / (i64::MAX as f32);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let normalized = self.normalize_text(text);
        Ok(self.encode(&normalized))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}
