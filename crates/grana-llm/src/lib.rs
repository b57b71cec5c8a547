// Language model collaborator: chat message types, the `ChatModel` seam the
// assistant loop drives, and the OpenAI chat-completions client behind it.

pub mod client;
pub mod messages;
pub mod model;

pub use client::{LlmClient, OpenAiClient};
pub use messages::{ChatMessage, FunctionCall, FunctionSchema, ModelReply, Role};
pub use model::{ChatModel, LlmError};
