//! Embedding providers and the process-wide model cache.

mod cache;
mod hashing;
#[cfg(feature = "local-embeddings")]
mod local;
mod openai;
mod provider;
mod registry;

pub use cache::{ModelCache, ProviderLoader};
pub use hashing::HashingEmbedder;
#[cfg(feature = "local-embeddings")]
pub use local::FastembedProvider;
pub use openai::OpenAiEmbedding;
pub use provider::{
    DEFAULT_EMBEDDING_DIM, EMBEDDING_DIM_384, EMBEDDING_DIM_768, EMBEDDING_DIM_1024,
    EmbeddingConfig, EmbeddingProvider,
};
pub use registry::{default_candidates, load_by_name};
