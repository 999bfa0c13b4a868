//! End-to-end tests over the ingestion and query paths, using in-process
//! fakes for the model backends and the memory store for persistence.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use folio_core::{
    ChatMessage, ChatProvider, ChunkingConfig, EmbeddingProvider, OnChunk, Progress, Result,
    VectorStore,
};

use crate::{Ingestor, MemoryVectorStore, RagChat};

/// Deterministic 3-dim embedding derived from the text bytes, plus a
/// fixed override for the query under test so retrieval is predictable.
struct FakeEmbedding;

fn toy_vector(text: &str) -> Vec<f32> {
    if text.contains("React") {
        return vec![1.0, 0.0, 0.0];
    }
    let mut acc = [0.1f32; 3];
    for (i, b) in text.bytes().enumerate() {
        acc[i % 3] += (b as f32) / 255.0;
    }
    let norm = acc.iter().map(|x| x * x).sum::<f32>().sqrt();
    acc.iter().map(|x| x / norm).collect()
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedding {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn dimension(&self) -> usize {
        3
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(toy_vector(text))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        on_progress: Progress<'_>,
    ) -> Result<Vec<Vec<f32>>> {
        if let Some(progress) = on_progress {
            progress(texts.len(), texts.len());
        }
        Ok(texts.iter().map(|t| toy_vector(t)).collect())
    }
}

/// Chat fake that records the system prompt it was handed
struct FakeChat {
    seen_system: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ChatProvider for FakeChat {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn generate(
        &self,
        system: &str,
        _history: &[ChatMessage],
        _user: &str,
    ) -> Result<String> {
        self.seen_system.lock().unwrap().push(system.to_string());
        Ok("canned reply".to_string())
    }

    async fn generate_stream(
        &self,
        system: &str,
        _history: &[ChatMessage],
        _user: &str,
        on_chunk: OnChunk<'_>,
    ) -> Result<()> {
        self.seen_system.lock().unwrap().push(system.to_string());
        on_chunk("canned ");
        on_chunk("reply");
        Ok(())
    }
}

fn corpus() -> Vec<folio_core::LoadedDocument> {
    use folio_core::{DocumentKind, LoadedDocument};
    vec![
        LoadedDocument {
            filename: "_resumes/2025.md".into(),
            content: "---\ntitle: Resume\n---\nEight years of React experience building \
                      production frontends, plus design systems work across two startups."
                .into(),
            kind: DocumentKind::Markdown,
        },
        LoadedDocument {
            filename: "_projects/folio.md".into(),
            content: "---\ntitle: Folio\n---\nA static portfolio site generator with a \
                      retrieval-backed chat assistant wired into the contact page."
                .into(),
            kind: DocumentKind::Markdown,
        },
        LoadedDocument {
            filename: "about.txt".into(),
            content: "General introduction text about the site owner and what this \
                      website covers, long enough to survive chunking."
                .into(),
            kind: DocumentKind::Text,
        },
    ]
}

fn ingestor(store: Arc<MemoryVectorStore>) -> Ingestor {
    Ingestor::new(
        Arc::new(FakeEmbedding),
        store,
        ChunkingConfig {
            chunk_size: 500,
            overlap: 100,
        },
    )
}

#[tokio::test]
async fn test_ingestion_reports_every_document() {
    let store = Arc::new(MemoryVectorStore::ephemeral());
    let report = ingestor(store.clone()).run(&corpus(), None).await.unwrap();

    assert_eq!(report.documents.len(), 3);
    assert!(report.documents.iter().all(|d| d.chunks >= 1));
    assert_eq!(report.records, report.chunks);
    assert!(report.approx_bytes > 0);
    assert_eq!(store.count().await.unwrap(), report.records);
}

#[tokio::test]
async fn test_reingestion_is_stable() {
    let store = Arc::new(MemoryVectorStore::ephemeral());
    let ingestor = ingestor(store.clone());

    let first = ingestor.run(&corpus(), None).await.unwrap();
    let second = ingestor.run(&corpus(), None).await.unwrap();

    assert_eq!(first.records, second.records);
    assert_eq!(store.count().await.unwrap(), first.records);
}

#[tokio::test]
async fn test_markdown_chunks_carry_collection_tag() {
    let store = Arc::new(MemoryVectorStore::ephemeral());
    ingestor(store.clone()).run(&corpus(), None).await.unwrap();

    let hits = store.search(&[1.0, 0.0, 0.0], 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].text.starts_with("[resume: Resume]"), "{}", hits[0].text);
    assert_eq!(
        hits[0].metadata.get("sourceType").map(String::as_str),
        Some("resume")
    );
}

#[tokio::test]
async fn test_question_retrieves_react_chunk_into_prompt() {
    let store = Arc::new(MemoryVectorStore::ephemeral());
    ingestor(store.clone()).run(&corpus(), None).await.unwrap();

    let seen_system = Arc::new(Mutex::new(Vec::new()));
    let engine = RagChat::new(
        Arc::new(FakeEmbedding),
        store,
        Arc::new(FakeChat {
            seen_system: seen_system.clone(),
        }),
        1,
        "Ada Example",
    );

    let reply = engine
        .answer("How much React experience do you have?", &[])
        .await
        .unwrap();
    assert_eq!(reply, "canned reply");

    let prompts = seen_system.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let between = prompts[0]
        .split("---")
        .nth(1)
        .expect("delimited documents section");
    assert!(between.contains("React experience"), "{}", prompts[0]);
}

#[tokio::test]
async fn test_streaming_delivers_fragments_in_order() {
    let store = Arc::new(MemoryVectorStore::ephemeral());
    ingestor(store.clone()).run(&corpus(), None).await.unwrap();

    let engine = RagChat::new(
        Arc::new(FakeEmbedding),
        store,
        Arc::new(FakeChat {
            seen_system: Arc::new(Mutex::new(Vec::new())),
        }),
        1,
        "Ada Example",
    );

    let mut collected = String::new();
    engine
        .answer_stream("Tell me about React.", &[], &mut |chunk: &str| {
            collected.push_str(chunk)
        })
        .await
        .unwrap();
    assert_eq!(collected, "canned reply");
}

#[tokio::test]
async fn test_embedding_outage_surfaces_as_chat_error() {
    struct Down;
    #[async_trait]
    impl EmbeddingProvider for Down {
        fn name(&self) -> &'static str {
            "down"
        }
        fn dimension(&self) -> usize {
            3
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(folio_core::Error::Embedding("connection refused".into()))
        }
        async fn embed_batch(
            &self,
            _texts: &[String],
            _on_progress: Progress<'_>,
        ) -> Result<Vec<Vec<f32>>> {
            Err(folio_core::Error::Embedding("connection refused".into()))
        }
    }

    let engine = RagChat::new(
        Arc::new(Down),
        Arc::new(MemoryVectorStore::ephemeral()),
        Arc::new(FakeChat {
            seen_system: Arc::new(Mutex::new(Vec::new())),
        }),
        1,
        "Ada Example",
    );

    let err = engine.answer("anything", &[]).await.unwrap_err();
    assert_eq!(err.step(), "chat");
    assert!(err.to_string().contains("temporarily unavailable"));
    // The real cause never leaks to the caller
    assert!(!err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_chat_backend_outage_hides_cause() {
    struct DownChat;
    #[async_trait]
    impl ChatProvider for DownChat {
        fn name(&self) -> &'static str {
            "down"
        }
        async fn generate(
            &self,
            _system: &str,
            _history: &[ChatMessage],
            _user: &str,
        ) -> Result<String> {
            Err(folio_core::Error::Chat(
                "Anthropic error 401 Unauthorized: invalid x-api-key".into(),
            ))
        }
        async fn generate_stream(
            &self,
            _system: &str,
            _history: &[ChatMessage],
            _user: &str,
            _on_chunk: OnChunk<'_>,
        ) -> Result<()> {
            Err(folio_core::Error::Chat(
                "Anthropic error 401 Unauthorized: invalid x-api-key".into(),
            ))
        }
    }

    let store = Arc::new(MemoryVectorStore::ephemeral());
    ingestor(store.clone()).run(&corpus(), None).await.unwrap();

    let engine = RagChat::new(Arc::new(FakeEmbedding), store, Arc::new(DownChat), 1, "Ada Example");

    let err = engine.answer("anything", &[]).await.unwrap_err();
    assert!(err.to_string().contains("temporarily unavailable"));
    assert!(!err.to_string().contains("401"));

    let err = engine
        .answer_stream("anything", &[], &mut |_chunk: &str| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("temporarily unavailable"));
    assert!(!err.to_string().contains("Unauthorized"));
}
