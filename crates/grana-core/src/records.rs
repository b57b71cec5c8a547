// Financial record types persisted by the assistant's tool handlers.
//
// Each struct doubles as the row shape for both store backends: field names
// are column names, and `id` is omitted on insert.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::category::{Category, ExpenseCategory, InvestmentType, RevenueCategory};
use crate::dates::{format_br, parse_datetime};
use crate::money::{format_brl, format_percentage};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// The four record collections the assistant can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Expenses,
    Revenues,
    Investments,
    Overtime,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Expenses,
        Resource::Revenues,
        Resource::Investments,
        Resource::Overtime,
    ];

    /// Resolve a resource name as sent by the model. Portuguese aliases are
    /// accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace(' ', "_").as_str() {
            "expenses" | "expense" | "despesas" | "despesa" | "gastos" => Some(Resource::Expenses),
            "revenues" | "revenue" | "incomes" | "income" | "receitas" | "receita" => {
                Some(Resource::Revenues)
            }
            "investments" | "investment" | "investimentos" | "investimento" => {
                Some(Resource::Investments)
            }
            "overtime" | "overtime_hours" | "horas_extras" | "hora_extra" => {
                Some(Resource::Overtime)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Expenses => "expenses",
            Resource::Revenues => "revenues",
            Resource::Investments => "investments",
            Resource::Overtime => "overtime",
        }
    }

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            Resource::Expenses => "expenses",
            Resource::Revenues => "incomes",
            Resource::Investments => "investments",
            Resource::Overtime => "overtime_hours",
        }
    }

    /// Column used for date-range filtering and ordering.
    pub fn date_column(&self) -> &'static str {
        match self {
            Resource::Overtime => "payment_date",
            _ => "date",
        }
    }

    /// Column summed by the summary tools.
    pub fn amount_column(&self) -> &'static str {
        match self {
            Resource::Overtime => "total_value",
            _ => "value",
        }
    }

    /// Column the category filter applies to, if any.
    pub fn category_column(&self) -> Option<&'static str> {
        match self {
            Resource::Expenses | Resource::Revenues => Some("category"),
            Resource::Investments => Some("investment_type"),
            Resource::Overtime => None,
        }
    }

    /// Lowercase Portuguese plural, for messages.
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Expenses => "despesas",
            Resource::Revenues => "receitas",
            Resource::Investments => "investimentos",
            Resource::Overtime => "horas extras",
        }
    }
}

// ---------------------------------------------------------------------------
// Row identifiers
// ---------------------------------------------------------------------------

/// Store-assigned row id: an integer for SQLite and bigint tables, a string
/// for uuid tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub user_id: String,
    pub value: f64,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revenue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub user_id: String,
    pub value: f64,
    pub category: RevenueCategory,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Marker stored in `where_invested` when the model does not say where the
/// money went.
pub const UNSPECIFIED_BROKER: &str = "não informado";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub user_id: String,
    pub value: f64,
    pub investment_type: InvestmentType,
    pub where_invested: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub user_id: String,
    pub hourly_rate: f64,
    /// Fraction paid on top of the hourly rate; 1.0 means +100%.
    pub overtime_percentage: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start_time: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end_time: NaiveDateTime,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub total_value: Option<f64>,
}

/// Timestamp columns come back naive from SQLite and as `timestamptz`
/// (`2026-10-15T18:00:00+00:00`) from Supabase; both read as naive UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_datetime(&text).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{text}'")))
}

/// Any stored record. Serializes as the bare row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Expense(Expense),
    Revenue(Revenue),
    Investment(Investment),
    Overtime(OvertimeEntry),
}

impl Record {
    pub fn resource(&self) -> Resource {
        match self {
            Record::Expense(_) => Resource::Expenses,
            Record::Revenue(_) => Resource::Revenues,
            Record::Investment(_) => Resource::Investments,
            Record::Overtime(_) => Resource::Overtime,
        }
    }

    pub fn id(&self) -> Option<&RecordId> {
        match self {
            Record::Expense(r) => r.id.as_ref(),
            Record::Revenue(r) => r.id.as_ref(),
            Record::Investment(r) => r.id.as_ref(),
            Record::Overtime(r) => r.id.as_ref(),
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Record::Expense(r) => &r.user_id,
            Record::Revenue(r) => &r.user_id,
            Record::Investment(r) => &r.user_id,
            Record::Overtime(r) => &r.user_id,
        }
    }

    /// The value of the resource's date column.
    pub fn date(&self) -> NaiveDate {
        match self {
            Record::Expense(r) => r.date,
            Record::Revenue(r) => r.date,
            Record::Investment(r) => r.date,
            Record::Overtime(r) => r.payment_date,
        }
    }

    /// The value of the resource's amount column. Overtime entries without
    /// a total count as zero.
    pub fn amount(&self) -> f64 {
        match self {
            Record::Expense(r) => r.value,
            Record::Revenue(r) => r.value,
            Record::Investment(r) => r.value,
            Record::Overtime(r) => r.total_value.unwrap_or(0.0),
        }
    }

    /// Short resource-specific description for listings.
    pub fn descriptor(&self) -> String {
        match self {
            Record::Expense(r) => match r.description.as_deref().map(str::trim) {
                Some(d) if !d.is_empty() => d.to_string(),
                _ => r.category.label().to_string(),
            },
            Record::Revenue(r) => r.category.label().to_string(),
            Record::Investment(r) => r.where_invested.clone(),
            Record::Overtime(r) => {
                format!("{} de adicional", format_percentage(r.overtime_percentage))
            }
        }
    }

    /// One bullet line: date, amount and descriptor.
    pub fn bullet(&self) -> String {
        format!(
            "• {} | {} | {}",
            format_br(self.date()),
            format_brl(self.amount()),
            self.descriptor()
        )
    }
}
