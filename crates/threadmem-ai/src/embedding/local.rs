//! Local embedding via fastembed ONNX models.
//!
//! Gated behind the `local-embeddings` feature: the ONNX runtime is a heavy
//! build-time dependency, and deployments that only need recency-based
//! retrieval can skip it entirely.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::provider::{
    EMBEDDING_DIM_384, EMBEDDING_DIM_768, EMBEDDING_DIM_1024, EmbeddingProvider,
};
use crate::error::{AiError, Result};

const MAX_TEXT_BYTES: usize = 2048;
const BATCH_SIZE: usize = 32;

pub struct FastembedProvider {
    // fastembed's embed() takes &mut self.
    model: Mutex<fastembed::TextEmbedding>,
    name: String,
    dimension: usize,
}

impl FastembedProvider {
    /// Download (on first use) and initialize a local embedding model.
    /// Models are cached on disk by fastembed after the first load.
    pub fn load(name: &str) -> Result<Self> {
        use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

        let (model_enum, dimension) = match name {
            "all-MiniLM-L6-v2" | "BAAI/bge-small-en-v1.5" | "bge-small-en-v1.5" => {
                (EmbeddingModel::BGESmallENV15, EMBEDDING_DIM_384)
            }
            "all-mpnet-base-v2" | "BAAI/bge-base-en-v1.5" | "bge-base-en-v1.5" => {
                (EmbeddingModel::BGEBaseENV15, EMBEDDING_DIM_768)
            }
            "BAAI/bge-large-en-v1.5" | "bge-large-en-v1.5" => {
                (EmbeddingModel::BGELargeENV15, EMBEDDING_DIM_1024)
            }
            other => return Err(AiError::UnsupportedModel(other.to_string())),
        };

        let options = InitOptions::new(model_enum).with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| AiError::ModelLoad(format!("{}: {}", name, e)))?;

        info!(model = name, dimension, "Initialized local embedding model");

        Ok(Self {
            model: Mutex::new(model),
            name: name.to_string(),
            dimension,
        })
    }
}

/// Truncate at a byte budget without splitting a UTF-8 sequence.
fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[async_trait]
impl EmbeddingProvider for FastembedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let normalized = self.normalize_text(text);
        let input = truncate_utf8(&normalized, MAX_TEXT_BYTES);

        let mut model = self.model.lock();
        let embeddings = model
            .embed(vec![input], None)
            .map_err(|e| AiError::Encode(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AiError::Encode("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let normalized: Vec<String> = texts.iter().map(|t| self.normalize_text(t)).collect();
        let inputs: Vec<&str> = normalized
            .iter()
            .map(|t| truncate_utf8(t, MAX_TEXT_BYTES))
            .collect();

        let mut model = self.model.lock();
        let mut all = Vec::with_capacity(inputs.len());
        for chunk in inputs.chunks(BATCH_SIZE) {
            let embeddings = model
                .embed(chunk.to_vec(), None)
                .map_err(|e| AiError::Encode(e.to_string()))?;
            all.extend(embeddings);
        }
        Ok(all)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
