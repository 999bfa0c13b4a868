//! Vector store backends
//!
//! Three interchangeable backends behind the [`VectorStore`] trait: an
//! in-process memory store for local development, Qdrant for self-hosted
//! deployments, and Supabase pgvector for the hosted path.

mod memory;
mod qdrant;
mod supabase;

pub use memory::MemoryVectorStore;
pub use qdrant::QdrantVectorStore;
pub use supabase::SupabaseVectorStore;

use std::path::PathBuf;
use std::sync::Arc;

use folio_core::{Error, Result, VectorStore, VectorStoreConfig};

/// Build the vector store named by the config
pub fn create_vector_store(config: &VectorStoreConfig) -> Result<Arc<dyn VectorStore>> {
    match config.provider.as_str() {
        "memory" => Ok(Arc::new(MemoryVectorStore::new(
            Some(PathBuf::from(&config.embeddings_path)),
            config.match_threshold,
        ))),
        "qdrant" => Ok(Arc::new(QdrantVectorStore::new(
            &config.qdrant_url,
            &config.qdrant_collection,
            config.match_threshold,
            config.batch_size,
        )?)),
        "supabase" => {
            let url = config.supabase_url.as_deref().ok_or_else(|| {
                Error::Configuration("SUPABASE_URL is required for the supabase store".into())
            })?;
            let key = config.supabase_key.as_deref().ok_or_else(|| {
                Error::Configuration(
                    "SUPABASE_SERVICE_ROLE_KEY is required for the supabase store".into(),
                )
            })?;
            Ok(Arc::new(SupabaseVectorStore::new(
                url,
                key,
                config.match_threshold,
                config.batch_size,
            )?))
        }
        other => Err(Error::Configuration(format!(
            "unknown vector store provider: {}",
            other
        ))),
    }
}
