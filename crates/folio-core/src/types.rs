//! Shared types across all pipeline modules

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a loaded source document, derived from its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Markdown,
    Pdf,
    Docx,
}

/// A source file after text extraction, before chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedDocument {
    pub filename: String,
    pub content: String,
    pub kind: DocumentKind,
}

/// A bounded slice of a source document, the unit of embedding and retrieval
///
/// `id` is derived from (source, position, content), so re-ingesting
/// unchanged content produces the same ids and upserts are idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub metadata: BTreeMap<String, String>,
}

/// A chunk plus its embedding, ready to be stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.id,
            text: chunk.text,
            metadata: chunk.metadata,
            embedding,
        }
    }
}

/// One hit from a similarity search, never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

/// Role of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a conversation; the caller supplies the full history
/// on every request, the server keeps no conversation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
