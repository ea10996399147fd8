//! Chat completion providers
//!
//! The context assembler hands a finished system prompt and the user's
//! message to a [`ChatProvider`]; each call is a single stateless turn.

mod openai;

pub use openai::OpenAiChat;

use crate::error::ChatError;
use async_trait::async_trait;

/// Single-turn chat completion
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, ChatError>;

    /// Model used for completions
    fn model(&self) -> &str;
}
