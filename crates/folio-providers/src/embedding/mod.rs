//! Embedding provider backends and factory

mod ollama;
mod openai;

use std::sync::Arc;

use folio_core::{EmbeddingConfig, EmbeddingProvider, Error, Result};

pub use ollama::OllamaEmbedding;
pub use openai::OpenAiEmbedding;

/// Select the embedding backend named by the configuration
pub fn create_embedding_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaEmbedding::new(
            config.ollama_base_url.clone(),
            config.ollama_model.clone(),
        )?)),
        "openai" => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                Error::Configuration("OPENAI_API_KEY not set for openai embedding provider".to_string())
            })?;
            Ok(Arc::new(OpenAiEmbedding::new(api_key, config.openai_model.clone())?))
        }
        other => Err(Error::Configuration(format!(
            "Unknown embedding provider: {}",
            other
        ))),
    }
}
