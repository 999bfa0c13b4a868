//! Flat-file vector store
//!
//! Keeps the whole corpus as one JSON blob, loaded once per process into
//! an `Arc` snapshot behind an `RwLock`. Readers clone the `Arc`, so a
//! search sees either the old corpus or the new one, never a torn mix.
//! Upsert rewrites the blob and swaps the snapshot. Sized for a personal
//! site corpus, not for anything that needs an index.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use folio_core::{
    cosine_similarity, ChunkRecord, Error, Progress, Result, SearchResult, VectorStore,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredData {
    chunks: Vec<ChunkRecord>,
    #[serde(rename = "createdAt")]
    created_at: String,
    count: usize,
}

#[derive(Default)]
struct State {
    loaded: bool,
    snapshot: Option<Arc<StoredData>>,
}

pub struct MemoryVectorStore {
    path: Option<PathBuf>,
    threshold: f32,
    state: RwLock<State>,
    dimension: AtomicUsize,
}

impl MemoryVectorStore {
    /// Store backed by a JSON file at `path`, or purely in-process when
    /// `path` is None.
    pub fn new(path: Option<PathBuf>, threshold: f32) -> Self {
        Self {
            path,
            threshold,
            state: RwLock::new(State::default()),
            dimension: AtomicUsize::new(0),
        }
    }

    /// Ephemeral store with no persistence and no score floor
    pub fn ephemeral() -> Self {
        Self::new(None, f32::MIN)
    }

    async fn read_blob(&self) -> Result<Option<Arc<StoredData>>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let data: StoredData = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;
                tracing::debug!(chunks = data.count, file = %path.display(), "embeddings loaded");
                Ok(Some(Arc::new(data)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::VectorStore(format!("{}: {}", path.display(), e))),
        }
    }

    async fn write_blob(&self, data: &StoredData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::VectorStore(format!("{}: {}", parent.display(), e)))?;
        }
        let bytes = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| Error::VectorStore(format!("{}: {}", path.display(), e)))
    }

    async fn snapshot(&self) -> Result<Option<Arc<StoredData>>> {
        {
            let state = self.state.read().await;
            if state.loaded {
                return Ok(state.snapshot.clone());
            }
        }
        let mut state = self.state.write().await;
        // Another task may have loaded while we waited for the write lock
        if !state.loaded {
            state.snapshot = self.read_blob().await?;
            state.loaded = true;
        }
        Ok(state.snapshot.clone())
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn init(&self, dimension: usize) -> Result<()> {
        self.dimension.store(dimension, Ordering::SeqCst);
        self.snapshot().await?;
        Ok(())
    }

    async fn upsert(&self, records: &[ChunkRecord], on_progress: Progress<'_>) -> Result<()> {
        let dimension = self.dimension.load(Ordering::SeqCst);
        if dimension > 0 {
            if let Some(bad) = records.iter().find(|r| r.embedding.len() != dimension) {
                return Err(Error::VectorStore(format!(
                    "embedding dimension mismatch for {}: got {}, expected {}",
                    bad.id,
                    bad.embedding.len(),
                    dimension
                )));
            }
        }

        let current = self.snapshot().await?;
        let mut chunks: Vec<ChunkRecord> = current
            .as_ref()
            .map(|d| d.chunks.clone())
            .unwrap_or_default();

        // Merge by id so re-ingesting a document replaces its records
        for record in records {
            match chunks.iter_mut().find(|c| c.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => chunks.push(record.clone()),
            }
        }

        let count = chunks.len();
        let data = StoredData {
            chunks,
            created_at: chrono::Utc::now().to_rfc3339(),
            count,
        };
        self.write_blob(&data).await?;

        let mut state = self.state.write().await;
        state.snapshot = Some(Arc::new(data));
        state.loaded = true;
        drop(state);

        if let Some(progress) = on_progress {
            progress(records.len(), records.len());
        }
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let Some(data) = self.snapshot().await? else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<SearchResult> = data
            .chunks
            .iter()
            .map(|chunk| SearchResult {
                id: chunk.id.clone(),
                score: cosine_similarity(embedding, &chunk.embedding),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
            })
            .filter(|r| r.score >= self.threshold)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_all(&self) -> Result<()> {
        let dropped = self.count().await.unwrap_or(0);
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::VectorStore(format!("{}: {}", path.display(), e))),
            }
        }
        let mut state = self.state.write().await;
        state.snapshot = None;
        state.loaded = true;
        tracing::warn!(dropped, "memory store cleared");
        Ok(())
    }

    async fn ping(&self) -> bool {
        true
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.snapshot().await?.map(|d| d.count).unwrap_or(0))
    }
}
