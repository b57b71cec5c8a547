// Chat-completions message types (function-calling dialect).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

/// A model-issued request to run one named function. `arguments` is the
/// raw JSON text exactly as the model produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    /// Always serialized; `null` for assistant turns that only call a
    /// function.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// The assistant turn that requested `call`, replayed back to the model.
    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    /// A synthetic turn carrying a function's result.
    pub fn function_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            content: Some(content.into()),
            name: Some(name.into()),
            function_call: None,
        }
    }
}

/// A function the model may call, described with JSON Schema parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// What the model answered: plain text, a function call, or both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelReply {
    pub content: Option<String>,
    pub function_call: Option<FunctionCall>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            function_call: None,
        }
    }

    pub fn call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            content: None,
            function_call: Some(FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn function_call_turn_serializes_null_content() {
        let msg = ChatMessage::function_call(FunctionCall {
            name: "create_expense".into(),
            arguments: "{\"amount\":25}".into(),
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "assistant",
                "content": null,
                "function_call": { "name": "create_expense", "arguments": "{\"amount\":25}" }
            })
        );
    }

    #[test]
    fn function_result_turn_carries_name() {
        let msg = ChatMessage::function_result("get_expense_summary", "{\"ok\":true}");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "role": "function", "content": "{\"ok\":true}", "name": "get_expense_summary" })
        );
    }

    #[test]
    fn caller_turns_deserialize() {
        let msg: ChatMessage =
            serde_json::from_value(json!({ "role": "user", "content": "oi" })).unwrap();
        assert_eq!(msg, ChatMessage::user("oi"));
    }
}
