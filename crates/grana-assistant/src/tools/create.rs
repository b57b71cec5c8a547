// Handlers that insert one record each.

use grana_core::category::{Category, ExpenseCategory, InvestmentType, RevenueCategory};
use grana_core::classify::normalize;
use grana_core::dates::format_br;
use grana_core::money::{format_brl, format_percentage, round_cents};
use grana_core::records::{
    Expense, Investment, OvertimeEntry, Record, Revenue, UNSPECIFIED_BROKER,
};
use grana_core::store::Store;
use tracing::info;

use super::args::{
    clean, date_or, datetime_or, optional_amount, positive_amount, ExpenseArgs, InvestmentArgs,
    OvertimeArgs, RevenueArgs,
};
use super::{ToolError, ToolResult, ToolSuccess};
use crate::context::ToolContext;

/// Percentages above this are read as whole percents (50 -> 0.5).
const WHOLE_PERCENT_THRESHOLD: f64 = 5.0;

pub(super) async fn expense(store: &dyn Store, ctx: &ToolContext, args: ExpenseArgs) -> ToolResult {
    let value = positive_amount(args.amount.as_ref(), "da despesa")?;
    let description = clean(args.description);
    let category =
        normalize::<ExpenseCategory>(args.category.as_deref(), description.as_deref());
    let date = date_or(args.date.as_deref(), "date", ctx.today())?;

    let record = Record::Expense(Expense {
        id: None,
        user_id: ctx.user_id.clone(),
        value,
        category,
        payment_method: clean(args.payment_method),
        description,
        date,
    });
    let stored = store.insert(record).await?;
    info!(user_id = %ctx.user_id, category = category.as_str(), "expense recorded");

    let message = format!(
        "Despesa de {} registrada em {} ({}).",
        format_brl(value),
        category.label(),
        format_br(date)
    );
    Ok(ToolSuccess::new("expense", serde_json::to_value(&stored)?, message))
}

pub(super) async fn revenue(store: &dyn Store, ctx: &ToolContext, args: RevenueArgs) -> ToolResult {
    let value = positive_amount(args.amount.as_ref(), "da receita")?;
    let description = clean(args.description);
    let category =
        normalize::<RevenueCategory>(args.category.as_deref(), description.as_deref());
    let date = date_or(args.date.as_deref(), "date", ctx.today())?;

    let record = Record::Revenue(Revenue {
        id: None,
        user_id: ctx.user_id.clone(),
        value,
        category,
        description,
        date,
    });
    let stored = store.insert(record).await?;
    info!(user_id = %ctx.user_id, category = category.as_str(), "revenue recorded");

    let message = format!(
        "Receita de {} registrada em {} ({}).",
        format_brl(value),
        category.label(),
        format_br(date)
    );
    Ok(ToolSuccess::new("revenue", serde_json::to_value(&stored)?, message))
}

pub(super) async fn investment(
    store: &dyn Store,
    ctx: &ToolContext,
    args: InvestmentArgs,
) -> ToolResult {
    let value = positive_amount(args.amount.as_ref(), "do investimento")?;
    let description = clean(args.description);
    let investment_type =
        normalize::<InvestmentType>(args.investment_type.as_deref(), description.as_deref());
    let where_invested =
        clean(args.where_invested).unwrap_or_else(|| UNSPECIFIED_BROKER.to_string());
    let date = date_or(args.date.as_deref(), "date", ctx.today())?;

    let message = format!(
        "Investimento de {} em {} registrado ({}, {}).",
        format_brl(value),
        investment_type.label(),
        where_invested,
        format_br(date)
    );
    let record = Record::Investment(Investment {
        id: None,
        user_id: ctx.user_id.clone(),
        value,
        investment_type,
        where_invested,
        description,
        date,
    });
    let stored = store.insert(record).await?;
    info!(user_id = %ctx.user_id, investment_type = investment_type.as_str(), "investment recorded");

    Ok(ToolSuccess::new("investment", serde_json::to_value(&stored)?, message))
}

pub(super) async fn overtime(store: &dyn Store, ctx: &ToolContext, args: OvertimeArgs) -> ToolResult {
    let hourly_rate = positive_amount(args.hourly_rate.as_ref(), "da hora")?;
    let overtime_percentage = percentage(args.overtime_percentage.as_ref())?;
    let now = ctx.now_naive();
    let start_time = datetime_or(args.start_time.as_deref(), "start_time", now)?;
    let end_time = datetime_or(args.end_time.as_deref(), "end_time", now)?;
    let payment_date = date_or(args.payment_date.as_deref(), "payment_date", ctx.today())?;

    let total_value = match optional_amount(args.total_value.as_ref(), "total_value")? {
        Some(total) => total,
        None => computed_total(hourly_rate, overtime_percentage, start_time, end_time),
    };

    let record = Record::Overtime(OvertimeEntry {
        id: None,
        user_id: ctx.user_id.clone(),
        hourly_rate,
        overtime_percentage,
        start_time,
        end_time,
        payment_date,
        total_value: Some(total_value),
    });
    let stored = store.insert(record).await?;
    info!(user_id = %ctx.user_id, "overtime recorded");

    let message = format!(
        "Hora extra registrada: {}/h com {} de adicional, total de {} (pagamento em {}).",
        format_brl(hourly_rate),
        format_percentage(overtime_percentage),
        format_brl(total_value),
        format_br(payment_date)
    );
    Ok(ToolSuccess::new("overtime", serde_json::to_value(&stored)?, message))
}

/// Overtime premium as a fraction. Absent means 100%.
fn percentage(value: Option<&serde_json::Value>) -> Result<f64, ToolError> {
    let raw = optional_amount(value, "overtime_percentage")?.unwrap_or(1.0);
    if raw < 0.0 {
        return Err(ToolError::Invalid(
            "O adicional de hora extra não pode ser negativo.".into(),
        ));
    }
    Ok(if raw > WHOLE_PERCENT_THRESHOLD { raw / 100.0 } else { raw })
}

fn computed_total(
    hourly_rate: f64,
    overtime_percentage: f64,
    start: chrono::NaiveDateTime,
    end: chrono::NaiveDateTime,
) -> f64 {
    let seconds = (end - start).num_seconds();
    if seconds <= 0 {
        return 0.0;
    }
    let hours = seconds as f64 / 3600.0;
    round_cents(hours * hourly_rate * (1.0 + overtime_percentage))
}
