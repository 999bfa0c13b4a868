//! Batch ingestion pipeline
//!
//! Load, chunk, embed, and store a document corpus. The store is wiped
//! and rebuilt in one run; a crash between `delete_all` and `upsert`
//! leaves the store empty until the next successful run. Acceptable for
//! a corpus this size, re-running the ingest recovers.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use folio_core::{
    Chunk, ChunkRecord, ChunkingConfig, DocumentKind, EmbeddingProvider, Error, LoadedDocument,
    Progress, Result, VectorStore,
};

use crate::chunker::chunk_text;
use crate::frontmatter::parse_frontmatter;
use crate::loader::{load_documents, markdown_to_text};

/// Per-document outcome of an ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub filename: String,
    pub kind: DocumentKind,
    pub chunks: usize,
}

/// Summary of a whole ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,
    pub chunks: usize,
    pub records: usize,
    pub approx_bytes: usize,
}

pub struct Ingestor {
    embeddings: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunking: ChunkingConfig,
}

/// Classify a document by the directory it lives in. The site keeps
/// resumes, projects, and posts in underscore-prefixed collections.
fn source_type(path: &str) -> &'static str {
    for component in Path::new(path).components() {
        match component.as_os_str().to_str() {
            Some("_resumes") => return "resume",
            Some("_projects") => return "project",
            Some("_posts") => return "post",
            _ => {}
        }
    }
    "document"
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

impl Ingestor {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            embeddings,
            store,
            chunking,
        }
    }

    /// Chunk one document. Markdown gets frontmatter stripped, the body
    /// flattened to plain text, and a `[sourceType: title]` tag folded
    /// into every chunk so retrieval hits stay self-describing.
    fn prepare(&self, doc: &LoadedDocument) -> Vec<Chunk> {
        match doc.kind {
            DocumentKind::Markdown => {
                let (frontmatter, body) = parse_frontmatter(&doc.content);
                let text = markdown_to_text(&body);
                let kind = source_type(&doc.filename);
                let title = frontmatter
                    .get("title")
                    .cloned()
                    .unwrap_or_else(|| file_stem(&doc.filename));

                let mut chunks = chunk_text(&text, &doc.filename, &self.chunking);
                for chunk in &mut chunks {
                    chunk.text = format!("[{}: {}] {}", kind, title, chunk.text);
                    chunk
                        .metadata
                        .insert("sourceType".to_string(), kind.to_string());
                    chunk.metadata.insert("title".to_string(), title.clone());
                    for (key, value) in &frontmatter {
                        chunk.metadata.entry(key.clone()).or_insert(value.clone());
                    }
                }
                chunks
            }
            _ => chunk_text(&doc.content, &doc.filename, &self.chunking),
        }
    }

    /// Ingest already-loaded documents: chunk, embed, wipe, upsert.
    pub async fn run(
        &self,
        documents: &[LoadedDocument],
        on_progress: Progress<'_>,
    ) -> Result<IngestReport> {
        let mut reports = Vec::with_capacity(documents.len());
        let mut chunks: Vec<Chunk> = Vec::new();
        for doc in documents {
            let doc_chunks = self.prepare(doc);
            tracing::info!(file = %doc.filename, chunks = doc_chunks.len(), "chunked");
            reports.push(DocumentReport {
                filename: doc.filename.clone(),
                kind: doc.kind,
                chunks: doc_chunks.len(),
            });
            chunks.extend(doc_chunks);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embeddings.embed_batch(&texts, on_progress).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "embedding count mismatch: {} texts, {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkRecord::new(chunk, embedding))
            .collect();
        let approx_bytes = serde_json::to_vec(&records)
            .map(|v| v.len())
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.store.init(self.embeddings.dimension()).await?;
        self.store.delete_all().await?;
        self.store.upsert(&records, None).await?;
        tracing::info!(
            documents = reports.len(),
            records = records.len(),
            approx_bytes,
            store = self.store.name(),
            "ingestion complete"
        );

        Ok(IngestReport {
            chunks: records.len(),
            records: records.len(),
            approx_bytes,
            documents: reports,
        })
    }

    /// Load every supported file under `dir` and ingest it
    pub async fn ingest_directory(
        &self,
        dir: &Path,
        recursive: bool,
        on_progress: Progress<'_>,
    ) -> Result<IngestReport> {
        let documents = load_documents(dir, recursive).await?;
        if documents.is_empty() {
            return Err(Error::DocumentLoad(format!(
                "no supported documents under {}",
                dir.display()
            )));
        }
        self.run(&documents, on_progress).await
    }
}
