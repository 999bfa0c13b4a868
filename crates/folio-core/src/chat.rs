//! Chat provider trait

use async_trait::async_trait;

use crate::types::ChatMessage;
use crate::Result;

/// Callback receiving incremental text fragments in emission order
pub type OnChunk<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Trait for chat generation backends
///
/// Callers pass history already normalized by [`crate::sanitize_history`]:
/// strict alternating-turn APIs reject histories with adjacent same-role
/// messages or a leading/trailing user-side imbalance.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short backend name, e.g. "anthropic"
    fn name(&self) -> &'static str;

    /// Produce a complete reply
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<String>;

    /// Produce a reply incrementally, invoking `on_chunk` per fragment
    async fn generate_stream(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
        on_chunk: OnChunk<'_>,
    ) -> Result<()>;
}
