// Per-request context handed to every tool handler.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Who is asking and when. The user id is trusted as given; the timestamp
/// drives every "default to now/today" rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    pub user_id: String,
    pub now: DateTime<Utc>,
}

impl ToolContext {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            now,
        }
    }

    /// Current UTC date.
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Current UTC timestamp without offset.
    pub fn now_naive(&self) -> NaiveDateTime {
        self.now.naive_utc()
    }
}
