// HTTP surface for the assistant.
//
// `POST /api/chat` runs one conversation turn; `GET /api/health` is a
// liveness check. CORS is permissive because the web client is served from
// another origin.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use grana_assistant::{Assistant, ToolContext};
use grana_llm::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    assistant: Arc<Assistant>,
}

impl AppState {
    pub fn new(assistant: Assistant) -> Self {
        Self {
            assistant: Arc::new(assistant),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<IncomingTurn>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A caller turn. Roles are kept as text so unexpected ones can be dropped
/// instead of rejecting the whole request.
#[derive(Debug, Deserialize)]
pub struct IncomingTurn {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl IncomingTurn {
    fn into_message(self) -> Option<ChatMessage> {
        let content = self.content.unwrap_or_default();
        match self.role.as_str() {
            "user" => Some(ChatMessage::user(content)),
            "assistant" => Some(ChatMessage::assistant(content)),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = ErrorBody {
        error: error.to_string(),
        details,
    };
    (status, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat).fallback(method_not_allowed))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Método não permitido", None)
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Corpo da requisição inválido",
                Some(rejection.body_text()),
            );
        }
    };

    let Some(user_id) = request
        .user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
    else {
        return error_response(StatusCode::BAD_REQUEST, "userId é obrigatório", None);
    };

    if !state.assistant.model_available() {
        error!("chat request refused: OPENAI_API_KEY is not configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "OPENAI_API_KEY não configurada",
            None,
        );
    }

    let total = request.messages.len();
    let history: Vec<ChatMessage> = request
        .messages
        .into_iter()
        .filter_map(IncomingTurn::into_message)
        .collect();
    if history.len() < total {
        warn!(dropped = total - history.len(), "ignored turns with unknown roles");
    }

    let ctx = ToolContext::new(user_id, Utc::now());
    match state.assistant.respond(&ctx, history).await {
        Ok(outcome) => Json(ChatResponse {
            reply: outcome.reply,
        })
        .into_response(),
        Err(err) => {
            error!(user_id = %ctx.user_id, "chat failed: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Erro ao processar a conversa",
                Some(err.to_string()),
            )
        }
    }
}
