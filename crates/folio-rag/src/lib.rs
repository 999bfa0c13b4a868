//! Document ingestion, vector stores, and RAG orchestration
//!
//! This crate covers both halves of the pipeline: the batch ingestion path
//! (load, chunk, embed, store) and the query path (embed, search, prompt,
//! generate) behind the `RagChat` orchestrator.

mod chunker;
mod engine;
mod frontmatter;
mod loader;
mod pipeline;
mod store;

#[cfg(test)]
mod tests;

pub use chunker::chunk_text;
pub use engine::RagChat;
pub use frontmatter::parse_frontmatter;
pub use loader::{load_documents, markdown_to_text, LoaderRegistry};
pub use pipeline::{DocumentReport, IngestReport, Ingestor};
pub use store::{create_vector_store, MemoryVectorStore, QdrantVectorStore, SupabaseVectorStore};

// Re-export core types for convenience
pub use folio_core::{
    Chunk, ChunkRecord, ChunkingConfig, Error, LoadedDocument, Result, SearchResult, VectorStore,
};
