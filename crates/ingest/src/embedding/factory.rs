use std::sync::Arc;

use async_trait::async_trait;
use ragprep_core::config::EmbeddingConfig;
use ragprep_core::ModelProfile;

use super::ollama::OllamaEmbedder;
use super::openai::OpenAiEmbedder;
use super::traits::{Embedder, EmbedderFactory, EmbeddingError};

/// Builds HTTP embedding backends from the embedding config section.
#[derive(Debug, Clone)]
pub struct HttpEmbedderFactory {
    config: EmbeddingConfig,
}

impl HttpEmbedderFactory {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EmbedderFactory for HttpEmbedderFactory {
    async fn load(&self, profile: &ModelProfile) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        let model = profile.model_id.to_string();
        match self.config.provider.to_ascii_lowercase().as_str() {
            "ollama" => {
                tracing::info!(url = %self.config.ollama_url, model = %model, "using Ollama embeddings");
                Ok(Arc::new(OllamaEmbedder::new(self.config.ollama_url.clone(), model)))
            }
            "openai" => {
                let api_key = self
                    .config
                    .openai_api_key
                    .clone()
                    .ok_or_else(|| EmbeddingError::ModelLoad("OPENAI_API_KEY is not set".into()))?;
                tracing::info!(model = %model, "using OpenAI-compatible embeddings");
                Ok(Arc::new(OpenAiEmbedder::new(
                    api_key,
                    model,
                    self.config.openai_base_url.clone(),
                )))
            }
            other => Err(EmbeddingError::ModelLoad(format!(
                "unknown embedding provider: {other}"
            ))),
        }
    }
}
