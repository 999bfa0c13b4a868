//! Document loader trait

use async_trait::async_trait;
use std::path::Path;

use crate::Result;

/// Trait for per-format text extractors
///
/// Each supported extension maps to exactly one loader; new formats are
/// added by implementing this trait and registering the loader, without
/// touching existing ones.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// File extensions (lowercase, without the dot) this loader handles
    fn extensions(&self) -> &'static [&'static str];

    /// Extract normalized plain text from the file
    async fn load(&self, path: &Path) -> Result<String>;
}
