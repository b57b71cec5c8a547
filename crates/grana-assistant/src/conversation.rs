// Conversation loop controller.
//
// Prepends the system prompt, then alternates model calls with tool
// execution until the model answers in plain text. A failing tool ends the
// conversation with its message as the reply; the model is not consulted
// again. At most `max_steps` model calls are made per request.

use std::sync::Arc;

use grana_core::store::Store;
use grana_llm::{ChatMessage, ChatModel, LlmError, Role};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::context::ToolContext;
use crate::prompt::system_prompt;
use crate::tools::ToolRegistry;

/// Model calls allowed per request unless configured otherwise.
pub const DEFAULT_MAX_STEPS: usize = 8;

/// Reply used when the model's final answer is empty.
pub const FALLBACK_REPLY: &str = "Desculpe, não consegui gerar uma resposta.";

/// Reply used when the step budget runs out.
pub fn step_limit_reply(max_steps: usize) -> String {
    format!(
        "Não consegui concluir sua solicitação após {max_steps} etapas. Tente reformular o pedido."
    )
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("{0}")]
    Model(#[from] LlmError),

    #[error("failed to encode tool result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The model answered without requesting a tool.
    Answered,
    /// A tool failed; the reply is its error message.
    ToolFailed { tool: String },
    /// Every allowed model call requested another tool.
    StepLimit,
}

/// Final reply plus bookkeeping for logs and callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub reply: String,
    pub stop: StopReason,
    /// Model calls made.
    pub steps: usize,
    /// Tools that ran successfully.
    pub tools_run: usize,
}

pub struct Assistant {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    max_steps: usize,
}

impl Assistant {
    pub fn new(model: Arc<dyn ChatModel>, store: Arc<dyn Store>) -> Self {
        Self {
            model,
            tools: ToolRegistry::new(store),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Override the step budget. Zero is raised to one.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Whether the model collaborator is configured.
    pub fn model_available(&self) -> bool {
        self.model.is_available()
    }

    /// Run one conversation turn for `ctx.user_id` over the caller's history.
    ///
    /// Only `user` and `assistant` text turns from the caller are kept.
    pub async fn respond(
        &self,
        ctx: &ToolContext,
        history: Vec<ChatMessage>,
    ) -> Result<AssistantReply, AssistantError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system_prompt(ctx.today())));
        messages.extend(caller_turns(history));

        let functions = self.tools.schemas();
        let mut tools_run = 0;

        for step in 1..=self.max_steps {
            let reply = self.model.complete(&messages, &functions).await?;

            let Some(call) = reply.function_call else {
                let text = reply
                    .content
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                return Ok(self.finish(ctx, text, StopReason::Answered, step, tools_run));
            };

            if step == self.max_steps {
                debug!(tool = %call.name, "step budget spent, tool call not executed");
                break;
            }

            debug!(step, tool = %call.name, arguments = %call.arguments, "model requested tool");
            match self.tools.dispatch(ctx, &call.name, &call.arguments).await {
                Ok(success) => {
                    tools_run += 1;
                    let envelope = serde_json::to_string(&success.envelope())?;
                    let name = call.name.clone();
                    messages.push(ChatMessage::function_call(call));
                    messages.push(ChatMessage::function_result(name, envelope));
                }
                Err(err) => {
                    warn!(tool = %call.name, user_id = %ctx.user_id, "tool failed: {err}");
                    let stop = StopReason::ToolFailed { tool: call.name };
                    return Ok(self.finish(ctx, err.to_string(), stop, step, tools_run));
                }
            }
        }

        warn!(user_id = %ctx.user_id, max_steps = self.max_steps, "step limit reached");
        Ok(self.finish(
            ctx,
            step_limit_reply(self.max_steps),
            StopReason::StepLimit,
            self.max_steps,
            tools_run,
        ))
    }

    fn finish(
        &self,
        ctx: &ToolContext,
        reply: String,
        stop: StopReason,
        steps: usize,
        tools_run: usize,
    ) -> AssistantReply {
        info!(user_id = %ctx.user_id, steps, tools_run, stop = ?stop, "chat completed");
        AssistantReply {
            reply,
            stop,
            steps,
            tools_run,
        }
    }
}

/// Keep the caller's non-blank user/assistant text turns, stripped of any
/// function call payloads.
fn caller_turns(history: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let total = history.len();
    let kept: Vec<ChatMessage> = history
        .into_iter()
        .filter_map(|m| {
            let content = m.content.filter(|c| !c.trim().is_empty())?;
            match m.role {
                Role::User => Some(ChatMessage::user(content)),
                Role::Assistant => Some(ChatMessage::assistant(content)),
                Role::System | Role::Function => None,
            }
        })
        .collect();
    if kept.len() < total {
        warn!(dropped = total - kept.len(), "dropped caller turns without user/assistant text");
    }
    kept
}
