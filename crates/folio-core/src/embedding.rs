//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Progress callback invoked as `(current, total)` after each completed
/// sub-batch of a batch operation
pub type Progress<'a> = Option<&'a (dyn Fn(usize, usize) + Send + Sync)>;

/// Trait for embedding backends (local model server, hosted API, ...)
///
/// `dimension` is a fixed per-backend constant known before any call.
/// Implementations retry transient transport failures internally with
/// bounded exponential backoff before surfacing an `Error::Embedding`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend name, e.g. "ollama"
    fn name(&self) -> &'static str;

    /// Fixed output vector length for this backend
    fn dimension(&self) -> usize;

    /// Convert one text into a vector of `dimension` floats
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Convert many texts, reporting progress per completed sub-batch.
    ///
    /// Backends differ in batching capability: some support true batch
    /// calls, others issue paced sequential calls. Either way the output
    /// order matches the input order.
    async fn embed_batch(&self, texts: &[String], on_progress: Progress<'_>)
        -> Result<Vec<Vec<f32>>>;
}
