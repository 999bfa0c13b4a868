//! Pipeline configuration
//!
//! A single explicit struct populated once at process start from environment
//! variables, then passed by reference into component constructors. Every
//! field has a default so a bare `from_env()` works for local development.

use serde::{Deserialize, Serialize};
use std::env;

fn env_str(key: &str, fallback: &str) -> String {
    env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn env_usize(key: &str, fallback: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn env_u64(key: &str, fallback: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn env_f32(key: &str, fallback: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// One of: ollama, openai
    pub provider: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub openai_model: String,
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// One of: memory, qdrant, supabase
    pub provider: String,
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    /// Path of the flat-file embeddings blob (memory provider)
    pub embeddings_path: String,
    pub batch_size: usize,
    pub match_threshold: f32,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// One of: ollama, anthropic
    pub provider: String,
    pub model: String,
    pub ollama_model: String,
    pub anthropic_api_key: Option<String>,
    pub max_tokens: u32,
    pub max_message_length: usize,
    pub max_history_length: usize,
    /// Name used in the assistant persona of the system prompt
    pub site_owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
}

/// Single source of truth for all pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub chat: ChatConfig,
    pub rate_limit: RateLimitConfig,
    pub server: ServerConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            chunking: ChunkingConfig {
                chunk_size: env_usize("CHUNK_SIZE", 500),
                overlap: env_usize("CHUNK_OVERLAP", 100),
            },
            embedding: EmbeddingConfig {
                provider: env_str("EMBEDDING_PROVIDER", "ollama"),
                ollama_base_url: env_str("OLLAMA_BASE_URL", "http://localhost:11434"),
                ollama_model: env_str("OLLAMA_EMBEDDING_MODEL", "nomic-embed-text"),
                openai_model: env_str("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small"),
                openai_api_key: env::var("OPENAI_API_KEY").ok(),
            },
            vector_store: VectorStoreConfig {
                provider: env_str("VECTOR_STORE_PROVIDER", "memory"),
                qdrant_url: env_str("QDRANT_URL", "http://localhost:6334"),
                qdrant_collection: env_str("QDRANT_COLLECTION", "documents"),
                supabase_url: env::var("SUPABASE_URL").ok(),
                supabase_key: env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
                embeddings_path: env_str("EMBEDDINGS_PATH", "data/embeddings.json"),
                batch_size: env_usize("UPSERT_BATCH_SIZE", 100),
                match_threshold: env_f32("MATCH_THRESHOLD", 0.3),
                top_k: env_usize("TOP_K", 5),
            },
            chat: ChatConfig {
                provider: env_str("CHAT_PROVIDER", "ollama"),
                model: env_str("CHAT_MODEL", "claude-sonnet-4-20250514"),
                ollama_model: env_str("OLLAMA_CHAT_MODEL", "llama3.2"),
                anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
                max_tokens: env_u64("CHAT_MAX_TOKENS", 1024) as u32,
                max_message_length: env_usize("CHAT_MAX_MESSAGE_LENGTH", 2000),
                max_history_length: env_usize("CHAT_MAX_HISTORY", 50),
                site_owner: env_str("SITE_OWNER", "the site owner"),
            },
            rate_limit: RateLimitConfig {
                window_ms: env_u64("RATE_LIMIT_WINDOW_MS", 60_000),
                max_requests: env_usize("RATE_LIMIT_MAX_REQUESTS", 10),
            },
            server: ServerConfig {
                bind_addr: env_str("BIND_ADDR", "127.0.0.1:8080"),
                allowed_origins: env_str("ALLOWED_ORIGINS", "http://localhost:3000")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
