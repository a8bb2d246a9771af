//! Per-chunk embedding with a lazily loaded, memoized backend.

use std::sync::{Arc, Mutex, PoisonError};

use ragprep_core::{Chunk, ModelProfile};
use tokio::sync::OnceCell;

use super::cache::{CacheStats, EmbeddingCache};
use super::traits::{Embedder, EmbedderFactory, EmbeddingError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbeddingStats {
    pub embedded: usize,
    pub failed: usize,
}

/// Owns one embedding backend for the lifetime of a processor. The backend is
/// built by the factory on first use and reused for every later chunk; calls
/// are made one chunk at a time.
pub struct EmbeddingGenerator {
    profile: &'static ModelProfile,
    factory: Arc<dyn EmbedderFactory>,
    embedder: OnceCell<Arc<dyn Embedder>>,
    cache: Option<Mutex<EmbeddingCache>>,
}

impl EmbeddingGenerator {
    /// `cache_size == 0` disables the vector cache.
    pub fn new(
        profile: &'static ModelProfile,
        factory: Arc<dyn EmbedderFactory>,
        cache_size: usize,
    ) -> Self {
        Self {
            profile,
            factory,
            embedder: OnceCell::new(),
            cache: (cache_size > 0).then(|| Mutex::new(EmbeddingCache::new(cache_size))),
        }
    }

    pub fn profile(&self) -> &'static ModelProfile {
        self.profile
    }

    pub fn is_loaded(&self) -> bool {
        self.embedder.initialized()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache
            .as_ref()
            .map(|c| c.lock().unwrap_or_else(PoisonError::into_inner).stats())
    }

    async fn embedder(&self) -> Result<&Arc<dyn Embedder>, EmbeddingError> {
        self.embedder
            .get_or_try_init(|| async {
                tracing::info!(model = self.profile.model_id, "loading embedding model");
                self.factory.load(self.profile).await
            })
            .await
    }

    /// Embed one chunk text: prefix, cache lookup, backend call, dimension check.
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let input = format!("{}{}", self.profile.instruction_prefix, text);
        if let Some(hit) = self.cached(&input) {
            return Ok(hit);
        }

        let vector = self.embedder().await?.embed(&input).await?;
        if vector.len() != self.profile.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.profile.dimensions,
                actual: vector.len(),
            });
        }

        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .put(&input, vector.clone());
        }
        Ok(vector)
    }

    fn cached(&self, input: &str) -> Option<Vec<f32>> {
        self.cache
            .as_ref()
            .and_then(|c| c.lock().unwrap_or_else(PoisonError::into_inner).get(input))
    }

    /// Embed every chunk in order. A failed chunk is logged and left without
    /// an embedding; the remaining chunks are still attempted.
    pub async fn embed_chunks(&self, chunks: &mut [Chunk]) -> EmbeddingStats {
        let mut stats = EmbeddingStats::default();

        if let Err(e) = self.embedder().await {
            tracing::warn!(error = %e, chunks = chunks.len(), "embedding model unavailable, skipping embeddings");
            for chunk in chunks.iter_mut() {
                chunk.embedding = None;
            }
            stats.failed = chunks.len();
            return stats;
        }

        for chunk in chunks.iter_mut() {
            match self.embed_text(&chunk.content).await {
                Ok(vector) => {
                    chunk.embedding = Some(vector);
                    stats.embedded += 1;
                }
                Err(e) => {
                    tracing::warn!(index = chunk.index, error = %e, "chunk embedding failed");
                    chunk.embedding = None;
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}
