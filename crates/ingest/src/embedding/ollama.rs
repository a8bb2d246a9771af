use super::traits::{Embedder, EmbeddingError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Embedder backed by a local Ollama instance.
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbedRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        let parsed: OllamaEmbedResponse = response.json().await?;
        parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::MalformedResponse("no embeddings returned".into()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
