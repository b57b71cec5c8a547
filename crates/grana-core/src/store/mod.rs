// Data store abstraction for financial records.
//
// The assistant only ever inserts a row (reading it back) or selects rows by
// user and date range. Two backends implement this: an embedded SQLite
// database and a Supabase (PostgREST) HTTP client.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::records::{Record, Resource};

pub mod postgrest;
pub mod sqlite;

pub use postgrest::PostgrestStore;
pub use sqlite::SqliteStore;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Store failures. Backend messages are carried verbatim so they can be shown
/// to the user as-is.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("resposta inválida do banco de dados: {0}")]
    Decode(String),

    #[error("conexão com o banco de dados indisponível")]
    Poisoned,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

/// A range-filtered select over one resource, scoped to one user.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub resource: Resource,
    pub user_id: String,
    /// Inclusive lower bound on the resource's date column.
    pub from: NaiveDate,
    /// Inclusive upper bound on the resource's date column.
    pub to: NaiveDate,
    /// Canonical category name; ignored for resources without a category
    /// column.
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub order: SortOrder,
}

impl RecordQuery {
    pub fn new(resource: Resource, user_id: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            resource,
            user_id: user_id.into(),
            from,
            to,
            category: None,
            limit: None,
            order: SortOrder::default(),
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = SortOrder::NewestFirst;
        self
    }

    /// The category filter, if the resource supports one.
    pub fn category_filter(&self) -> Option<(&'static str, &str)> {
        let column = self.resource.category_column()?;
        self.category.as_deref().map(|c| (column, c))
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a record and return it as stored (with its id).
    async fn insert(&self, record: Record) -> Result<Record, StoreError>;

    /// Select the records matching `query`.
    async fn select(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError>;
}
