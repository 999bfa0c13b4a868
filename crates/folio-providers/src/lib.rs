//! Embedding and chat provider backends for the folio chat pipeline
//!
//! Each backend is an independent adapter behind the capability traits in
//! `folio-core`; factories select the concrete implementation from the
//! pipeline configuration at startup.

mod embedding;
mod chat;
mod sse;

#[cfg(test)]
mod tests;

pub use chat::{create_chat_provider, AnthropicChat, OllamaChat};
pub use embedding::{create_embedding_provider, OllamaEmbedding, OpenAiEmbedding};

// Re-export core types for convenience
pub use folio_core::{ChatProvider, EmbeddingProvider, Error, Result};
