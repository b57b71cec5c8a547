// The assistant dispatch loop: a fixed registry of seven financial tools and
// the controller that alternates model calls with tool execution until the
// model answers in plain text.

pub mod context;
pub mod conversation;
pub mod prompt;
pub mod tools;

pub use context::ToolContext;
pub use conversation::{Assistant, AssistantError, AssistantReply, StopReason};
pub use tools::{Tool, ToolError, ToolRegistry, ToolSuccess};
