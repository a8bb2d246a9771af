use std::sync::Arc;

use async_trait::async_trait;
use ragprep_core::ModelProfile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model load failed: {0}")]
    ModelLoad(String),
}

/// Trait for embedding backends (Ollama, OpenAI-compatible, test fakes).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text. Callers prepend any instruction prefix themselves.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Backend model name, for logs.
    fn model_name(&self) -> &str;
}

/// Builds the embedder for a model profile. Called at most once per
/// [`EmbeddingGenerator`](super::EmbeddingGenerator).
#[async_trait]
pub trait EmbedderFactory: Send + Sync {
    async fn load(&self, profile: &ModelProfile) -> Result<Arc<dyn Embedder>, EmbeddingError>;
}
