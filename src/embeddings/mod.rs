//! Embeddings generation module
//!
//! Provides the client used to embed retrieval queries, supporting:
//! - OpenAI-compatible endpoints (text-embedding-ada-002, text-embedding-3-small, etc.)
//! - Ollama (local models)

pub mod client;

pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        // An API key or an OpenAI-looking endpoint selects the OpenAI wire
        // format; everything else is assumed to be Ollama.
        let provider = if config.embeddings.api_key.is_some()
            || config.embedding_endpoint().contains("openai")
        {
            EmbeddingProvider::OpenAI
        } else {
            EmbeddingProvider::Ollama
        };

        Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embedding_endpoint().to_string(),
            api_key: config.embeddings.api_key.clone(),
        }
    }
}
