//! Process-wide embedding model cache.
//!
//! Loading a model is expensive (possibly a weights download), so the cache
//! walks its candidate list at most once: the first successful load is kept
//! for the lifetime of the process, and a fully failed walk is also kept.
//! Either way the outcome is sticky until [`ModelCache::clear`] is called.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use super::provider::{DEFAULT_EMBEDDING_DIM, EmbeddingProvider};
use super::registry;
use crate::error::{AiError, Result};

pub type ProviderLoader =
    Arc<dyn Fn(&str) -> Result<Arc<dyn EmbeddingProvider>> + Send + Sync>;

enum CacheState {
    Unloaded,
    Loaded {
        provider: Arc<dyn EmbeddingProvider>,
        name: String,
    },
    Unavailable {
        tried: Vec<String>,
    },
}

pub struct ModelCache {
    candidates: Vec<String>,
    loader: ProviderLoader,
    state: Mutex<CacheState>,
}

impl ModelCache {
    pub fn new(candidates: Vec<String>) -> Self {
        Self::with_loader(candidates, Arc::new(|name| registry::load_by_name(name)))
    }

    /// Cache over the built-in candidate list.
    pub fn with_defaults() -> Self {
        Self::new(registry::default_candidates())
    }

    /// Inject a custom loader. Used by tests to observe load attempts.
    pub fn with_loader(candidates: Vec<String>, loader: ProviderLoader) -> Self {
        Self {
            candidates,
            loader,
            state: Mutex::new(CacheState::Unloaded),
        }
    }

    /// Return the cached provider, walking the candidate chain on first call.
    /// Once every candidate has failed this returns
    /// [`AiError::NoModelAvailable`] without retrying; that verdict holds
    /// until [`clear`](Self::clear).
    pub fn get(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let mut state = self.state.lock();
        match &*state {
            CacheState::Loaded { provider, .. } => Ok(provider.clone()),
            CacheState::Unavailable { tried } => {
                Err(AiError::NoModelAvailable {
                    tried: tried.clone(),
                })
            }
            CacheState::Unloaded => {
                match try_load_first_successful(&self.candidates, &self.loader) {
                    Some((provider, name)) => {
                        *state = CacheState::Loaded {
                            provider: provider.clone(),
                            name,
                        };
                        Ok(provider)
                    }
                    None => {
                        *state = CacheState::Unavailable {
                            tried: self.candidates.clone(),
                        };
                        Err(AiError::NoModelAvailable {
                            tried: self.candidates.clone(),
                        })
                    }
                }
            }
        }
    }

    /// True only when a provider is already cached. Never triggers a load.
    pub fn is_loaded(&self) -> bool {
        matches!(&*self.state.lock(), CacheState::Loaded { .. })
    }

    pub fn active_model(&self) -> Option<String> {
        match &*self.state.lock() {
            CacheState::Loaded { name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    /// Dimension of the cached provider, or the default when nothing is
    /// loaded. Callers sizing buffers before the first embed get a stable
    /// answer either way.
    pub fn dimensions(&self) -> usize {
        match &*self.state.lock() {
            CacheState::Loaded { provider, .. } => provider.dimension(),
            _ => DEFAULT_EMBEDDING_DIM,
        }
    }

    /// Drop the cached outcome so the next [`get`](Self::get) retries the
    /// chain. The escape hatch after fixing an environment problem (missing
    /// API key, offline model download).
    pub fn clear(&self) {
        *self.state.lock() = CacheState::Unloaded;
    }
}

fn try_load_first_successful(
    candidates: &[String],
    loader: &ProviderLoader,
) -> Option<(Arc<dyn EmbeddingProvider>, String)> {
    for name in candidates {
        match loader(name) {
            Ok(provider) => {
                info!(
                    model = name.as_str(),
                    dimension = provider.dimension(),
                    "Embedding model ready"
                );
                return Some((provider, name.clone()));
            }
            Err(e) => {
                warn!(model = name.as_str(), error = %e, "Embedding model failed to load");
            }
        }
    }
    warn!(
        tried = candidates.len(),
        "No embedding model available; semantic retrieval disabled"
    );
    None
}
