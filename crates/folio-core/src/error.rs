//! Error types for the folio pipeline
//!
//! One variant per pipeline stage plus infrastructure variants. Lower layers
//! fold their causes into the message; the orchestrator re-wraps retrieval
//! failures into `Chat` before anything reaches the HTTP layer.

use thiserror::Error;

/// Result type used across the folio system
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the folio pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error("Document load error: {0}")]
    DocumentLoad(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The pipeline stage this error belongs to
    pub fn step(&self) -> &'static str {
        match self {
            Error::DocumentLoad(_) => "document-load",
            Error::Embedding(_) => "embedding",
            Error::VectorStore(_) => "vector-store",
            Error::Chat(_) => "chat",
            Error::Configuration(_) => "configuration",
            Error::Network(_) => "network",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io",
        }
    }

    /// True for failures of an upstream service (embedding, store, model)
    /// as opposed to caller mistakes or local bugs
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Embedding(_) | Error::VectorStore(_) | Error::Chat(_) | Error::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_tags() {
        assert_eq!(Error::DocumentLoad("x".into()).step(), "document-load");
        assert_eq!(Error::Embedding("x".into()).step(), "embedding");
        assert_eq!(Error::VectorStore("x".into()).step(), "vector-store");
        assert_eq!(Error::Chat("x".into()).step(), "chat");
    }

    #[test]
    fn test_display_includes_stage_and_cause() {
        insta::assert_snapshot!(
            Error::DocumentLoad("resume.pdf: invalid xref table".into()).to_string(),
            @"Document load error: resume.pdf: invalid xref table"
        );
    }

    #[test]
    fn test_upstream_classification() {
        assert!(Error::Embedding("down".into()).is_upstream());
        assert!(Error::VectorStore("down".into()).is_upstream());
        assert!(Error::Chat("down".into()).is_upstream());
        assert!(!Error::Configuration("missing".into()).is_upstream());
    }
}
