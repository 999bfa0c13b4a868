//! Factory and configuration tests for provider backends

use folio_core::{ChatConfig, EmbeddingConfig};

use crate::{create_chat_provider, create_embedding_provider};

fn embedding_config(provider: &str) -> EmbeddingConfig {
    EmbeddingConfig {
        provider: provider.to_string(),
        ollama_base_url: "http://localhost:11434".to_string(),
        ollama_model: "nomic-embed-text".to_string(),
        openai_model: "text-embedding-3-small".to_string(),
        openai_api_key: None,
    }
}

fn chat_config(provider: &str) -> ChatConfig {
    ChatConfig {
        provider: provider.to_string(),
        model: "claude-sonnet-4-20250514".to_string(),
        ollama_model: "llama3.2".to_string(),
        anthropic_api_key: None,
        max_tokens: 1024,
        max_message_length: 2000,
        max_history_length: 50,
        site_owner: "the site owner".to_string(),
    }
}

#[test]
fn test_embedding_factory_selects_backend() {
    let provider = create_embedding_provider(&embedding_config("ollama")).unwrap();
    assert_eq!(provider.name(), "ollama");
    assert_eq!(provider.dimension(), 768);

    let mut config = embedding_config("openai");
    config.openai_api_key = Some("test-key".to_string());
    let provider = create_embedding_provider(&config).unwrap();
    assert_eq!(provider.name(), "openai");
    assert_eq!(provider.dimension(), 1536);
}

#[test]
fn test_embedding_factory_rejects_unknown_provider() {
    let err = create_embedding_provider(&embedding_config("bedrock"))
        .err()
        .expect("unknown provider must be rejected");
    assert_eq!(err.step(), "configuration");
}

#[test]
fn test_embedding_factory_requires_openai_key() {
    let err = create_embedding_provider(&embedding_config("openai"))
        .err()
        .expect("missing key must be rejected");
    assert_eq!(err.step(), "configuration");
}

#[test]
fn test_chat_factory_selects_backend() {
    let provider = create_chat_provider(&chat_config("ollama"), "http://localhost:11434").unwrap();
    assert_eq!(provider.name(), "ollama");

    let mut config = chat_config("anthropic");
    config.anthropic_api_key = Some("test-key".to_string());
    let provider = create_chat_provider(&config, "http://localhost:11434").unwrap();
    assert_eq!(provider.name(), "anthropic");
}

#[test]
fn test_chat_factory_rejects_unknown_provider() {
    let err = create_chat_provider(&chat_config("bedrock"), "http://localhost:11434")
        .err()
        .expect("unknown provider must be rejected");
    assert_eq!(err.step(), "configuration");
}

#[test]
fn test_chat_factory_requires_anthropic_key() {
    let err = create_chat_provider(&chat_config("anthropic"), "http://localhost:11434")
        .err()
        .expect("missing key must be rejected");
    assert_eq!(err.step(), "configuration");
}
