// Supabase (PostgREST) record store.
//
// Talks to `<url>/rest/v1/<table>` with the service key. Inserts ask for
// `return=representation` so the stored row comes back in the same call.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{RecordQuery, SortOrder, Store, StoreError};
use crate::records::{Expense, Investment, OvertimeEntry, Record, Resource, Revenue};

pub struct PostgrestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, resource: Resource) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            resource.table()
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl Store for PostgrestStore {
    async fn insert(&self, record: Record) -> Result<Record, StoreError> {
        let resource = record.resource();
        let response = self
            .authorized(self.http.post(self.table_url(resource)))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;

        let rows = read_rows(response).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".into()))?;
        debug!(table = resource.table(), "inserted record");
        decode_record(resource, row)
    }

    async fn select(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        let response = self
            .authorized(self.http.get(self.table_url(query.resource)))
            .query(&select_params(query))
            .send()
            .await?;

        read_rows(response)
            .await?
            .into_iter()
            .map(|row| decode_record(query.resource, row))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Request/response helpers
// ---------------------------------------------------------------------------

/// Query-string pairs for a range select.
pub(crate) fn select_params(query: &RecordQuery) -> Vec<(String, String)> {
    let date_col = query.resource.date_column();
    let mut params = vec![
        ("select".to_string(), "*".to_string()),
        ("user_id".to_string(), format!("eq.{}", query.user_id)),
        (date_col.to_string(), format!("gte.{}", query.from)),
        (date_col.to_string(), format!("lte.{}", query.to)),
    ];

    if let Some((column, category)) = query.category_filter() {
        params.push((column.to_string(), format!("eq.{category}")));
    }

    let direction = match query.order {
        SortOrder::OldestFirst => "asc",
        SortOrder::NewestFirst => "desc",
    };
    params.push(("order".to_string(), format!("{date_col}.{direction}")));

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

async fn read_rows(response: reqwest::Response) -> Result<Vec<Value>, StoreError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(StoreError::Remote {
            status: status.as_u16(),
            message: remote_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
}

/// PostgREST errors carry a `message` field; fall back to the raw body.
pub(crate) fn remote_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

pub(crate) fn decode_record(resource: Resource, row: Value) -> Result<Record, StoreError> {
    let decoded = match resource {
        Resource::Expenses => serde_json::from_value::<Expense>(row).map(Record::Expense),
        Resource::Revenues => serde_json::from_value::<Revenue>(row).map(Record::Revenue),
        Resource::Investments => serde_json::from_value::<Investment>(row).map(Record::Investment),
        Resource::Overtime => serde_json::from_value::<OvertimeEntry>(row).map(Record::Overtime),
    };
    decoded.map_err(|e| StoreError::Decode(e.to_string()))
}
