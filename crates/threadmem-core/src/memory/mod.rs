//! Retrieval: similarity scoring and context window assembly.

pub mod context;
pub mod similarity;

pub use context::ContextAssembler;
pub use similarity::cosine_similarity;
