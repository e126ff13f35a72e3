pub mod openai;
pub mod types;

pub use openai::OpenAiClient;
pub use types::*;

use anyhow::Result;
use async_trait::async_trait;

/// Opaque text-completion capability driving the write agent
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce one completion for the accumulated conversation
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
