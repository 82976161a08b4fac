use async_trait::async_trait;
use anyhow::Result;

/// Seam over the chat-completion service so the generation pipeline can be
/// exercised against canned responses in tests.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Sends the user prompt (together with the provider's fixed system
    /// instruction) and returns the assistant message content.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
