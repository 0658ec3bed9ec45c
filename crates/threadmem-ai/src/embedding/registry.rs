//! Model name resolution.
//!
//! Names accepted here:
//! - `"hashing"` - deterministic test provider, always available
//! - `"openai:<model>"` - hosted API, requires `OPENAI_API_KEY`
//! - anything else - local fastembed model (needs the `local-embeddings` feature)

use std::sync::Arc;

use super::hashing::HashingEmbedder;
use super::openai::OpenAiEmbedding;
use super::provider::EmbeddingProvider;
use crate::error::Result;

/// Preferred models, tried in order until one loads.
pub fn default_candidates() -> Vec<String> {
    vec![
        "all-MiniLM-L6-v2".to_string(),
        "BAAI/bge-small-en-v1.5".to_string(),
        "BAAI/bge-base-en-v1.5".to_string(),
    ]
}

/// Resolve a model name to a live provider. Loading a local model may
/// download weights on first use, so callers should treat this as slow.
pub fn load_by_name(name: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    if name == "hashing" {
        return Ok(Arc::new(HashingEmbedder::default()));
    }

    if let Some(model) = name.strip_prefix("openai:") {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            crate::error::AiError::ModelLoad(format!(
                "{}: OPENAI_API_KEY is not set",
                name
            ))
        })?;
        let model = (!model.is_empty()).then(|| model.to_string());
        return Ok(Arc::new(OpenAiEmbedding::new(api_key, model)));
    }

    load_local(name)
}

#[cfg(feature = "local-embeddings")]
fn load_local(name: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = super::local::FastembedProvider::load(name)?;
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "local-embeddings"))]
fn load_local(name: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    Err(crate::error::AiError::ModelLoad(format!(
        "{}: local models require the `local-embeddings` feature",
        name
    )))
}
