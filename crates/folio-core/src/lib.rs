//! Core traits and types for the folio chat pipeline
//!
//! This crate defines the fundamental traits and types used across the folio
//! system. It provides capability-facing interfaces for embedding providers,
//! vector stores, chat providers, and document loaders, making the system
//! test-friendly and extensible.

pub mod chat;
pub mod config;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod retry;
pub mod sanitize;
pub mod similarity;
pub mod types;
pub mod vector_store;

pub use chat::{ChatProvider, OnChunk};
pub use config::{
    ChatConfig, ChunkingConfig, EmbeddingConfig, PipelineConfig, RateLimitConfig, ServerConfig,
    VectorStoreConfig,
};
pub use embedding::{EmbeddingProvider, Progress};
pub use error::{Error, Result};
pub use loader::DocumentLoader;
pub use retry::with_retry;
pub use sanitize::{sanitize_history, sanitize_input};
pub use similarity::cosine_similarity;
pub use types::{Chunk, ChunkRecord, DocumentKind, LoadedDocument, Role, SearchResult, ChatMessage};
pub use vector_store::VectorStore;
