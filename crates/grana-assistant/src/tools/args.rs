// Argument structs for each tool plus the shared parsing rules: amount
// coercion, date defaulting, range resolution and limit clamping.

use chrono::{NaiveDate, NaiveDateTime};
use grana_core::dates::{format_br, month_start, parse_date, parse_datetime};
use grana_core::money::coerce_amount;
use grana_core::records::Resource;
use serde::Deserialize;
use serde_json::Value;

use super::ToolError;
use crate::context::ToolContext;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExpenseArgs {
    pub amount: Option<Value>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RevenueArgs {
    pub amount: Option<Value>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InvestmentArgs {
    pub amount: Option<Value>,
    pub investment_type: Option<String>,
    pub where_invested: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OvertimeArgs {
    pub hourly_rate: Option<Value>,
    pub overtime_percentage: Option<Value>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub payment_date: Option<String>,
    pub total_value: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExpenseSummaryArgs {
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FinancialSummaryArgs {
    pub resource: Option<String>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FinancialDetailsArgs {
    pub resource: Option<String>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<Value>,
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

/// Trimmed, non-empty text or `None`.
pub fn clean(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// A required positive amount. `what` names the field in the failure
/// message, e.g. "da despesa".
pub fn positive_amount(value: Option<&Value>, what: &str) -> Result<f64, ToolError> {
    match value.and_then(coerce_amount) {
        Some(v) if v > 0.0 => Ok(v),
        Some(_) => Err(ToolError::Invalid(format!(
            "O valor {what} precisa ser maior que zero."
        ))),
        None => Err(ToolError::Invalid(format!(
            "Não consegui entender o valor {what}. Informe um número, por exemplo 25,90."
        ))),
    }
}

/// An optional amount: absent or `null` is `None`, anything else must parse.
pub fn optional_amount(value: Option<&Value>, field: &str) -> Result<Option<f64>, ToolError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => coerce_amount(v).map(Some).ok_or_else(|| {
            ToolError::Invalid(format!("Não consegui entender o valor de {field}."))
        }),
    }
}

/// A date field, defaulting to `fallback` when absent or blank.
pub fn date_or(text: Option<&str>, field: &str, fallback: NaiveDate) -> Result<NaiveDate, ToolError> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(fallback),
        Some(t) => parse_date(t).ok_or_else(|| invalid_date(field, t)),
    }
}

/// A timestamp field, defaulting to `fallback` when absent or blank.
pub fn datetime_or(
    text: Option<&str>,
    field: &str,
    fallback: NaiveDateTime,
) -> Result<NaiveDateTime, ToolError> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(fallback),
        Some(t) => parse_datetime(t).ok_or_else(|| invalid_date(field, t)),
    }
}

fn invalid_date(field: &str, text: &str) -> ToolError {
    ToolError::Invalid(format!(
        "Data inválida em {field}: '{text}'. Use o formato AAAA-MM-DD."
    ))
}

/// Resolve `[from, to]`. `to` defaults to today and `from` to the first day
/// of `to`'s month.
pub fn date_range(
    ctx: &ToolContext,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), ToolError> {
    let to = date_or(to, "to", ctx.today())?;
    let from = date_or(from, "from", month_start(to))?;
    if from > to {
        return Err(ToolError::Invalid(format!(
            "O período é inválido: {} é depois de {}.",
            format_br(from),
            format_br(to)
        )));
    }
    Ok((from, to))
}

/// A required resource name; Portuguese aliases are accepted.
pub fn resource(text: Option<&str>) -> Result<Resource, ToolError> {
    let text = text.map(str::trim).filter(|t| !t.is_empty()).ok_or_else(|| {
        ToolError::Invalid(
            "Informe o tipo de lançamento: expenses, revenues, investments ou overtime.".into(),
        )
    })?;
    Resource::from_name(text).ok_or_else(|| {
        ToolError::Invalid(format!(
            "Tipo de lançamento desconhecido: '{text}'. Use expenses, revenues, investments ou overtime."
        ))
    })
}

/// Row limit for listings: default 20, clamped to `[1, 50]`. Numbers,
/// numeric strings and fractional values are accepted; anything else falls
/// back to the default.
pub fn clamp_limit(value: Option<&Value>) -> usize {
    let requested = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match requested {
        Some(n) => n.clamp(1, MAX_LIMIT as i64) as usize,
        None => DEFAULT_LIMIT,
    }
}
