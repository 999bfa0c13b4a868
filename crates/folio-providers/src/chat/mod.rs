//! Chat provider backends and factory

mod anthropic;
mod ollama;

use std::sync::Arc;

use folio_core::{ChatConfig, ChatProvider, Error, Result};

pub use anthropic::AnthropicChat;
pub use ollama::OllamaChat;

/// Select the chat backend named by the configuration
pub fn create_chat_provider(
    config: &ChatConfig,
    ollama_base_url: &str,
) -> Result<Arc<dyn ChatProvider>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaChat::new(
            ollama_base_url.to_string(),
            config.ollama_model.clone(),
            config.max_tokens,
        )?)),
        "anthropic" => {
            let api_key = config.anthropic_api_key.clone().ok_or_else(|| {
                Error::Configuration("ANTHROPIC_API_KEY not set for anthropic chat provider".to_string())
            })?;
            Ok(Arc::new(AnthropicChat::new(
                api_key,
                config.model.clone(),
                config.max_tokens,
            )?))
        }
        other => Err(Error::Configuration(format!(
            "Unknown chat provider: {}",
            other
        ))),
    }
}
