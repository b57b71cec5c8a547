// Read-only handlers: range summaries and recent-record listings.

use chrono::NaiveDate;
use grana_core::category::{Category, ExpenseCategory, InvestmentType, RevenueCategory};
use grana_core::classify::normalize;
use grana_core::dates::format_br;
use grana_core::money::{format_brl, round_cents};
use grana_core::records::{Record, Resource};
use grana_core::store::{RecordQuery, Store};
use serde_json::json;
use tracing::debug;

use super::args::{
    clamp_limit, clean, date_range, resource, ExpenseSummaryArgs, FinancialDetailsArgs,
    FinancialSummaryArgs,
};
use super::{ToolResult, ToolSuccess};
use crate::context::ToolContext;

/// A normalized category filter: stored name plus display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CategoryFilter {
    name: &'static str,
    label: &'static str,
}

impl CategoryFilter {
    fn of<C: Category>(text: &str) -> Self {
        let category = normalize::<C>(Some(text), None);
        Self {
            name: category.as_str(),
            label: category.label(),
        }
    }

    /// Resolve free text against the resource's own category set. Overtime
    /// has no categories.
    fn for_resource(resource: Resource, text: Option<String>) -> Option<Self> {
        let text = clean(text)?;
        match resource {
            Resource::Expenses => Some(Self::of::<ExpenseCategory>(&text)),
            Resource::Revenues => Some(Self::of::<RevenueCategory>(&text)),
            Resource::Investments => Some(Self::of::<InvestmentType>(&text)),
            Resource::Overtime => None,
        }
    }
}

/// Rows of one resource in a range, optionally filtered.
struct Selection {
    resource: Resource,
    from: NaiveDate,
    to: NaiveDate,
    category: Option<CategoryFilter>,
}

impl Selection {
    fn query(&self, ctx: &ToolContext) -> RecordQuery {
        RecordQuery::new(self.resource, ctx.user_id.clone(), self.from, self.to)
            .with_category(self.category.map(|c| c.name.to_string()))
    }

    /// "despesas em Alimentação" / "receitas"
    fn subject(&self) -> String {
        match self.category {
            Some(c) => format!("{} em {}", self.resource.label(), c.label),
            None => self.resource.label().to_string(),
        }
    }

    fn period(&self) -> String {
        format!("entre {} e {}", format_br(self.from), format_br(self.to))
    }
}

async fn summarize(
    store: &dyn Store,
    ctx: &ToolContext,
    selection: &Selection,
    kind: &'static str,
) -> ToolResult {
    let rows = store.select(&selection.query(ctx)).await?;
    let total = round_cents(rows.iter().map(Record::amount).sum());
    let count = rows.len();
    debug!(resource = selection.resource.as_str(), count, total, "summary computed");

    let message = format!(
        "Total de {} {}: {} ({} {}).",
        selection.subject(),
        selection.period(),
        format_brl(total),
        count,
        if count == 1 { "lançamento" } else { "lançamentos" }
    );
    let data = json!({
        "resource": selection.resource.as_str(),
        "total": total,
        "count": count,
        "from": selection.from,
        "to": selection.to,
        "category": selection.category.map(|c| c.name),
    });
    Ok(ToolSuccess::new(kind, data, message))
}

pub(super) async fn expense_summary(
    store: &dyn Store,
    ctx: &ToolContext,
    args: ExpenseSummaryArgs,
) -> ToolResult {
    let (from, to) = date_range(ctx, args.from.as_deref(), args.to.as_deref())?;
    let selection = Selection {
        resource: Resource::Expenses,
        from,
        to,
        category: CategoryFilter::for_resource(Resource::Expenses, args.category),
    };
    summarize(store, ctx, &selection, "expense_summary").await
}

pub(super) async fn financial_summary(
    store: &dyn Store,
    ctx: &ToolContext,
    args: FinancialSummaryArgs,
) -> ToolResult {
    let resource = resource(args.resource.as_deref())?;
    let (from, to) = date_range(ctx, args.from.as_deref(), args.to.as_deref())?;
    let selection = Selection {
        resource,
        from,
        to,
        category: CategoryFilter::for_resource(resource, args.category),
    };
    summarize(store, ctx, &selection, "financial_summary").await
}

pub(super) async fn financial_details(
    store: &dyn Store,
    ctx: &ToolContext,
    args: FinancialDetailsArgs,
) -> ToolResult {
    let resource = resource(args.resource.as_deref())?;
    let (from, to) = date_range(ctx, args.from.as_deref(), args.to.as_deref())?;
    let limit = clamp_limit(args.limit.as_ref());
    let selection = Selection {
        resource,
        from,
        to,
        category: CategoryFilter::for_resource(resource, args.category),
    };

    let query = selection.query(ctx).newest_first().with_limit(limit);
    let rows = store.select(&query).await?;
    debug!(resource = resource.as_str(), limit, count = rows.len(), "details listed");

    let message = if rows.is_empty() {
        format!("Nenhum lançamento de {} {}.", selection.subject(), selection.period())
    } else {
        let lines: Vec<String> = rows.iter().map(Record::bullet).collect();
        format!(
            "Lançamentos de {} {} (mais recentes primeiro):\n{}",
            selection.subject(),
            selection.period(),
            lines.join("\n")
        )
    };
    let data = json!({
        "resource": resource.as_str(),
        "from": from,
        "to": to,
        "category": selection.category.map(|c| c.name),
        "limit": limit,
        "count": rows.len(),
        "items": rows,
    });
    Ok(ToolSuccess::new("financial_details", data, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_filter_normalizes_per_resource() {
        assert_eq!(
            CategoryFilter::for_resource(Resource::Expenses, Some("Alimentação".into())),
            Some(CategoryFilter { name: "food", label: "Alimentação" })
        );
        assert_eq!(
            CategoryFilter::for_resource(Resource::Investments, Some("crypto".into())).map(|c| c.name),
            Some("crypto")
        );
        assert_eq!(
            CategoryFilter::for_resource(Resource::Revenues, Some("xyz".into())).map(|c| c.name),
            Some("other")
        );
    }

    #[test]
    fn category_filter_ignored_for_overtime_and_blank() {
        assert_eq!(CategoryFilter::for_resource(Resource::Overtime, Some("food".into())), None);
        assert_eq!(CategoryFilter::for_resource(Resource::Expenses, Some("  ".into())), None);
    }

    #[test]
    fn selection_wording() {
        let selection = Selection {
            resource: Resource::Expenses,
            from: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            category: Some(CategoryFilter { name: "food", label: "Alimentação" }),
        };
        assert_eq!(selection.subject(), "despesas em Alimentação");
        assert_eq!(selection.period(), "entre 01/10/2026 e 16/10/2026");
    }
}
