pub mod cache;
pub mod factory;
pub mod generator;
pub mod ollama;
pub mod openai;
pub mod traits;

pub use cache::{CacheStats, EmbeddingCache};
pub use factory::HttpEmbedderFactory;
pub use generator::{EmbeddingGenerator, EmbeddingStats};
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbedderFactory, EmbeddingError};
