//! Vector store trait

use async_trait::async_trait;

use crate::embedding::Progress;
use crate::types::{ChunkRecord, SearchResult};
use crate::Result;

/// Trait for vector stores (flat-file scan, Qdrant, pgvector over REST)
///
/// All backends share the same ordering contract: `search` returns results
/// sorted by descending cosine similarity, truncated to `top_k`, with
/// records below the configured similarity threshold excluded.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name, e.g. "qdrant"
    fn name(&self) -> &'static str;

    /// Ensure backing schema/collection exists for the given vector
    /// dimension. Safe to call multiple times.
    async fn init(&self, dimension: usize) -> Result<()>;

    /// Insert or update records, idempotent by id. Writes happen in
    /// internal batches; a mid-run failure reports which batch failed
    /// without undoing earlier batches.
    async fn upsert(&self, records: &[ChunkRecord], on_progress: Progress<'_>) -> Result<()>;

    /// Top-K nearest neighbors of `embedding` by cosine similarity
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Remove every record. Destructive; used only for full re-ingestion.
    async fn delete_all(&self) -> Result<()>;

    /// Liveness check, never errors
    async fn ping(&self) -> bool;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;
}
