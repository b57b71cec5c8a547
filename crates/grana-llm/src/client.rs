// OpenAI chat-completions client.
//
// Sends the conversation plus the function registry to
// `<base_url>/chat/completions` with `function_call: "auto"` and parses the
// first choice into a `ModelReply`. Both the legacy `function_call` field and
// the newer `tool_calls` array are understood.

use std::time::Duration;

use async_trait::async_trait;
use grana_core::config::Config;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::messages::{ChatMessage, FunctionCall, FunctionSchema, ModelReply};
use crate::model::{ChatModel, LlmError};

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// Low-level chat-completions client.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        model: String,
        base_url: String,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            api_key,
            model,
            base_url,
            temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSchema],
    ) -> Result<ModelReply, LlmError> {
        let body = request_body(&self.model, self.temperature, messages, functions);
        debug!(model = %self.model, turns = messages.len(), "chat completion request");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(%status, "chat completion failed");
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON: {e}")))?;
        parse_completion(&value)
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that can be either an active client or disabled.
pub enum LlmClient {
    /// The API key is configured and the client is ready.
    Active(OpenAiClient),
    /// No API key configured; every call fails with `LlmError::Disabled`.
    Disabled,
}

impl LlmClient {
    /// Build an `LlmClient` from the application config.
    ///
    /// Returns `Active` if an API key is present in credentials, otherwise
    /// returns `Disabled`.
    pub fn from_config(config: &Config) -> Self {
        match &config.credentials.openai_api_key {
            Some(key) if !key.trim().is_empty() => {
                let http = reqwest::Client::builder()
                    .timeout(Duration::from_secs(config.llm.request_timeout_secs))
                    .build()
                    .unwrap_or_else(|e| {
                        warn!("failed to build HTTP client with timeout, using defaults: {e}");
                        reqwest::Client::new()
                    });
                LlmClient::Active(OpenAiClient::new(
                    http,
                    key.clone(),
                    config.llm.model.clone(),
                    config.llm.base_url.clone(),
                    config.llm.temperature,
                ))
            }
            _ => LlmClient::Disabled,
        }
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSchema],
    ) -> Result<ModelReply, LlmError> {
        match self {
            LlmClient::Active(client) => client.complete(messages, functions).await,
            LlmClient::Disabled => Err(LlmError::Disabled),
        }
    }

    fn is_available(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

pub(crate) fn request_body(
    model: &str,
    temperature: f32,
    messages: &[ChatMessage],
    functions: &[FunctionSchema],
) -> Value {
    let mut body = json!({
        "model": model,
        "temperature": temperature,
        "messages": messages,
    });
    if !functions.is_empty() {
        body["functions"] = json!(functions);
        body["function_call"] = json!("auto");
    }
    body
}

/// Extract the first choice's message.
///
/// Expected shape: `{ "choices": [ { "message": { "content": ..., "function_call": { "name", "arguments" } } } ] }`
pub(crate) fn parse_completion(value: &Value) -> Result<ModelReply, LlmError> {
    let message = value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| LlmError::MalformedResponse("missing choices[0].message".into()))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string);

    let call = message.get("function_call").or_else(|| {
        message
            .get("tool_calls")
            .and_then(|t| t.get(0))
            .and_then(|t| t.get("function"))
    });

    let function_call = match call {
        Some(call) => {
            let name = call
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| LlmError::MalformedResponse("function call without name".into()))?;
            let arguments = match call.get("arguments") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            Some(FunctionCall {
                name: name.to_string(),
                arguments,
            })
        }
        None => None,
    };

    Ok(ModelReply {
        content,
        function_call,
    })
}

/// Extract a human-readable error from an error response body.
///
/// Expected shape: `{ "error": { "message": "..." } }`
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_text_reply() {
        let value = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Olá! Como posso ajudar?" },
                "finish_reason": "stop"
            }]
        });
        let reply = parse_completion(&value).unwrap();
        assert_eq!(reply.content.as_deref(), Some("Olá! Como posso ajudar?"));
        assert!(reply.function_call.is_none());
    }

    #[test]
    fn parse_legacy_function_call() {
        let value = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": {
                        "name": "create_expense",
                        "arguments": "{\"amount\": 25, \"description\": \"lanche\"}"
                    }
                },
                "finish_reason": "function_call"
            }]
        });
        let reply = parse_completion(&value).unwrap();
        assert_eq!(reply.content, None);
        let call = reply.function_call.unwrap();
        assert_eq!(call.name, "create_expense");
        assert_eq!(call.arguments, "{\"amount\": 25, \"description\": \"lanche\"}");
    }

    #[test]
    fn parse_tool_calls_array() {
        let value = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "get_expense_summary", "arguments": "{}" }
                    }]
                }
            }]
        });
        let call = parse_completion(&value).unwrap().function_call.unwrap();
        assert_eq!(call.name, "get_expense_summary");
        assert_eq!(call.arguments, "{}");
    }

    #[test]
    fn parse_object_arguments_are_reencoded() {
        let value = json!({
            "choices": [{ "message": { "function_call": { "name": "x", "arguments": { "a": 1 } } } }]
        });
        let call = parse_completion(&value).unwrap().function_call.unwrap();
        assert_eq!(call.arguments, "{\"a\":1}");
    }

    #[test]
    fn parse_missing_choices_is_malformed() {
        let err = parse_completion(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn parse_function_call_without_name_is_malformed() {
        let value = json!({ "choices": [{ "message": { "function_call": { "arguments": "{}" } } }] });
        assert!(matches!(
            parse_completion(&value),
            Err(LlmError::MalformedResponse(_))
        ));
    }

    #[test]
    fn request_body_includes_functions_when_present() {
        let functions = vec![FunctionSchema {
            name: "create_expense".into(),
            description: "Registra uma despesa".into(),
            parameters: json!({ "type": "object", "properties": {} }),
        }];
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("oi")];
        let body = request_body("gpt-4o-mini", 0.5, &messages, &functions);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["messages"][1]["content"], "oi");
        assert_eq!(body["functions"][0]["name"], "create_expense");
        assert_eq!(body["function_call"], "auto");
    }

    #[test]
    fn request_body_omits_functions_when_empty() {
        let body = request_body("m", 0.0, &[ChatMessage::user("oi")], &[]);
        assert!(body.get("functions").is_none());
        assert!(body.get("function_call").is_none());
    }

    #[test]
    fn extract_error_message_from_openai_body() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Incorrect API key provided");
        assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = OpenAiClient::new(
            reqwest::Client::new(),
            "k".into(),
            "m".into(),
            "https://api.openai.com/v1/".into(),
            0.2,
        );
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn disabled_client_refuses_calls() {
        let client = LlmClient::Disabled;
        assert!(!client.is_available());
        let err = client.complete(&[ChatMessage::user("oi")], &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Disabled));
    }

    fn config_with_key(key: Option<&str>) -> Config {
        use grana_core::config::{
            CredentialsConfig, LlmConfig, ServerConfig, StoreBackend, StoreConfig,
        };
        Config {
            server: ServerConfig {
                bind: "127.0.0.1:0".into(),
            },
            llm: LlmConfig {
                model: "gpt-4o-mini".into(),
                base_url: "https://api.openai.com/v1".into(),
                temperature: 0.2,
                max_steps: 8,
                request_timeout_secs: 5,
            },
            store: StoreConfig {
                backend: StoreBackend::Sqlite,
                sqlite_path: ":memory:".into(),
                supabase_url: None,
            },
            credentials: CredentialsConfig {
                openai_api_key: key.map(str::to_string),
                supabase_service_key: None,
            },
        }
    }

    #[test]
    fn from_config_needs_a_real_key() {
        assert!(LlmClient::from_config(&config_with_key(Some("sk-test"))).is_available());
        assert!(!LlmClient::from_config(&config_with_key(None)).is_available());
        assert!(!LlmClient::from_config(&config_with_key(Some("   "))).is_available());
    }

    // -- Integration-style tests against a local HTTP server --

    /// Answer one request on a local port with `status` and `body`, handing
    /// back the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        });
        (format!("http://{addr}/v1"), task)
    }

    fn client_at(base_url: String) -> OpenAiClient {
        OpenAiClient::new(
            reqwest::Client::new(),
            "sk-test".into(),
            "gpt-4o-mini".into(),
            base_url,
            0.2,
        )
    }

    fn expense_schema() -> FunctionSchema {
        FunctionSchema {
            name: "create_expense".into(),
            description: "Registra uma despesa".into(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    #[tokio::test]
    async fn complete_posts_functions_and_reads_call() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":null,"function_call":{"name":"create_expense","arguments":"{\"value\":25}"}},"finish_reason":"function_call"}]}"#,
        )
        .await;

        let reply = client_at(url)
            .complete(&[ChatMessage::user("gastei 25 no lanche")], &[expense_schema()])
            .await
            .unwrap();
        let call = reply.function_call.unwrap();
        assert_eq!(call.name, "create_expense");
        assert_eq!(call.arguments, r#"{"value":25}"#);
        assert!(reply.content.is_none());

        let request = server.await.unwrap();
        let lower = request.to_lowercase();
        assert!(lower.starts_with("post /v1/chat/completions "), "{request}");
        assert!(lower.contains("authorization: bearer sk-test"));
        assert!(request.contains(r#""function_call":"auto""#));
        assert!(request.contains(r#""model":"gpt-4o-mini""#));
        assert!(request.contains("gastei 25 no lanche"));
    }

    #[tokio::test]
    async fn complete_maps_error_status() {
        let (url, _server) = serve_once(
            "401 Unauthorized",
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        )
        .await;

        let err = client_at(url)
            .complete(&[ChatMessage::user("oi")], &[])
            .await
            .unwrap_err();
        match err {
            LlmError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_rejects_non_json_body() {
        let (url, _server) = serve_once("200 OK", "<html>gateway</html>").await;
        let err = client_at(url)
            .complete(&[ChatMessage::user("oi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)), "{err:?}");
    }
}
