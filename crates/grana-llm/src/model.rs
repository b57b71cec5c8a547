// The `ChatModel` trait and its error type.

use async_trait::async_trait;
use thiserror::Error;

use crate::messages::{ChatMessage, FunctionSchema, ModelReply};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM not configured")]
    Disabled,

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// One request/response round-trip with a function-calling chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the full conversation and the function registry; return the
    /// model's text and/or function call.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSchema],
    ) -> Result<ModelReply, LlmError>;

    /// Whether the model can be called at all (credentials present).
    fn is_available(&self) -> bool {
        true
    }
}
