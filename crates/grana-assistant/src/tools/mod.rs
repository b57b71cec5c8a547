// Tool registry: the seven named functions the model may call, their JSON
// schemas, and dispatch from a raw `{name, arguments}` request to a typed
// handler.
//
// Every handler returns `Result<ToolSuccess, ToolError>`. Success becomes the
// `{ok, type, data, message}` envelope fed back to the model; an error ends
// the conversation with its message as the final reply.

mod args;
mod create;
mod query;
mod schema;

use std::sync::Arc;

use grana_core::store::{Store, StoreError};
use grana_llm::FunctionSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::context::ToolContext;

// ---------------------------------------------------------------------------
// Tool names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    CreateExpense,
    CreateRevenue,
    CreateInvestment,
    CreateOvertime,
    GetExpenseSummary,
    GetFinancialSummary,
    GetFinancialDetails,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::CreateExpense,
        Tool::CreateRevenue,
        Tool::CreateInvestment,
        Tool::CreateOvertime,
        Tool::GetExpenseSummary,
        Tool::GetFinancialSummary,
        Tool::GetFinancialDetails,
    ];

    /// Function name as exposed to the model.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::CreateExpense => "create_expense",
            Tool::CreateRevenue => "create_revenue",
            Tool::CreateInvestment => "create_investment",
            Tool::CreateOvertime => "create_overtime",
            Tool::GetExpenseSummary => "get_expense_summary",
            Tool::GetFinancialSummary => "get_financial_summary",
            Tool::GetFinancialDetails => "get_financial_details",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn schema(&self) -> FunctionSchema {
        schema::function_schema(*self)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A successful tool run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSuccess {
    /// Envelope `type`, e.g. `expense` or `financial_summary`.
    pub kind: &'static str,
    pub data: Value,
    /// Portuguese confirmation the model can relay to the user.
    pub message: String,
}

impl ToolSuccess {
    pub fn new(kind: &'static str, data: Value, message: impl Into<String>) -> Self {
        Self {
            kind,
            data,
            message: message.into(),
        }
    }

    pub fn envelope(&self) -> Value {
        json!({
            "ok": true,
            "type": self.kind,
            "data": self.data,
            "message": self.message,
        })
    }
}

/// Why a tool run failed. The `Display` text is what the user sees.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} not implemented")]
    NotImplemented(String),

    #[error("Não entendi os parâmetros de {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },

    /// Domain validation failure, already phrased for the user.
    #[error("{0}")]
    Invalid(String),

    /// Store failures surface verbatim.
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Falha ao montar o resultado: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ToolError {
    pub fn envelope(&self) -> Value {
        json!({ "ok": false, "error": self.to_string() })
    }
}

pub type ToolResult = Result<ToolSuccess, ToolError>;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The fixed tool set bound to one data store.
pub struct ToolRegistry {
    store: Arc<dyn Store>,
}

impl ToolRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Schemas for every tool, in registry order.
    pub fn schemas(&self) -> Vec<FunctionSchema> {
        Tool::ALL.iter().map(Tool::schema).collect()
    }

    /// Run the tool called `name` with the model's raw JSON `arguments`.
    pub async fn dispatch(&self, ctx: &ToolContext, name: &str, arguments: &str) -> ToolResult {
        let tool = Tool::from_name(name).ok_or_else(|| ToolError::NotImplemented(name.to_string()))?;
        debug!(tool = tool.name(), user_id = %ctx.user_id, "dispatching tool");

        let store = self.store.as_ref();
        match tool {
            Tool::CreateExpense => create::expense(store, ctx, decode(tool, arguments)?).await,
            Tool::CreateRevenue => create::revenue(store, ctx, decode(tool, arguments)?).await,
            Tool::CreateInvestment => create::investment(store, ctx, decode(tool, arguments)?).await,
            Tool::CreateOvertime => create::overtime(store, ctx, decode(tool, arguments)?).await,
            Tool::GetExpenseSummary => {
                query::expense_summary(store, ctx, decode(tool, arguments)?).await
            }
            Tool::GetFinancialSummary => {
                query::financial_summary(store, ctx, decode(tool, arguments)?).await
            }
            Tool::GetFinancialDetails => {
                query::financial_details(store, ctx, decode(tool, arguments)?).await
            }
        }
    }
}

/// Parse the model's argument text into a handler's argument struct. Empty
/// text counts as `{}`.
fn decode<T: DeserializeOwned>(tool: Tool, arguments: &str) -> Result<T, ToolError> {
    let text = if arguments.trim().is_empty() { "{}" } else { arguments };
    serde_json::from_str(text).map_err(|e| ToolError::InvalidArguments {
        tool: tool.name(),
        reason: e.to_string(),
    })
}
