// SQLite-backed record store.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};
use tracing::debug;

use super::{RecordQuery, SortOrder, Store, StoreError};
use crate::category::{Category, ExpenseCategory, InvestmentType, RevenueCategory};
use crate::records::{Expense, Investment, OvertimeEntry, Record, RecordId, Resource, Revenue};

const EXPENSE_COLUMNS: &str = "id, user_id, value, category, payment_method, description, date";
const REVENUE_COLUMNS: &str = "id, user_id, value, category, description, date";
const INVESTMENT_COLUMNS: &str =
    "id, user_id, value, investment_type, where_invested, description, date";
const OVERTIME_COLUMNS: &str = "id, user_id, hourly_rate, overtime_percentage, start_time, \
     end_time, payment_date, total_value";

/// SQLite persistence for expenses, incomes, investments and overtime.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database at `path` and ensure all tables exist.
    /// Pass `":memory:"` for an ephemeral database (useful for tests).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS expenses (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id        TEXT NOT NULL,
                value          REAL NOT NULL,
                category       TEXT NOT NULL,
                payment_method TEXT,
                description    TEXT,
                date           TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS incomes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL,
                value       REAL NOT NULL,
                category    TEXT NOT NULL,
                description TEXT,
                date        TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS investments (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL,
                value           REAL NOT NULL,
                investment_type TEXT NOT NULL,
                where_invested  TEXT NOT NULL,
                description     TEXT,
                date            TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS overtime_hours (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id             TEXT NOT NULL,
                hourly_rate         REAL NOT NULL,
                overtime_percentage REAL NOT NULL,
                start_time          TEXT NOT NULL,
                end_time            TEXT NOT NULL,
                payment_date        TEXT NOT NULL,
                total_value         REAL
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_incomes_user_date ON incomes(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_investments_user_date ON investments(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_overtime_user_date ON overtime_hours(user_id, payment_date);
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn insert_sync(&self, record: &Record) -> Result<Record, StoreError> {
        let conn = self.conn()?;
        match record {
            Record::Expense(e) => conn.execute(
                "INSERT INTO expenses (user_id, value, category, payment_method, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    e.user_id,
                    e.value,
                    e.category.as_str(),
                    e.payment_method,
                    e.description,
                    e.date,
                ],
            )?,
            Record::Revenue(r) => conn.execute(
                "INSERT INTO incomes (user_id, value, category, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![r.user_id, r.value, r.category.as_str(), r.description, r.date],
            )?,
            Record::Investment(i) => conn.execute(
                "INSERT INTO investments (user_id, value, investment_type, where_invested, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    i.user_id,
                    i.value,
                    i.investment_type.as_str(),
                    i.where_invested,
                    i.description,
                    i.date,
                ],
            )?,
            Record::Overtime(o) => conn.execute(
                "INSERT INTO overtime_hours
                    (user_id, hourly_rate, overtime_percentage, start_time, end_time, payment_date, total_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    o.user_id,
                    o.hourly_rate,
                    o.overtime_percentage,
                    o.start_time,
                    o.end_time,
                    o.payment_date,
                    o.total_value,
                ],
            )?,
        };

        let id = conn.last_insert_rowid();
        let resource = record.resource();
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            columns(resource),
            resource.table()
        );
        let stored = conn.query_row(&sql, params![id], |row| decode_row(resource, row))?;
        debug!(table = resource.table(), id, "inserted record");
        Ok(stored)
    }

    fn select_sync(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        let resource = query.resource;
        let date_col = resource.date_column();

        let mut sql = format!(
            "SELECT {} FROM {} WHERE user_id = ?1 AND {date_col} >= ?2 AND {date_col} <= ?3",
            columns(resource),
            resource.table(),
        );
        let mut values = vec![
            SqlValue::Text(query.user_id.clone()),
            SqlValue::Text(query.from.to_string()),
            SqlValue::Text(query.to.to_string()),
        ];

        if let Some((column, category)) = query.category_filter() {
            sql.push_str(&format!(" AND {column} = ?4"));
            values.push(SqlValue::Text(category.to_string()));
        }

        match query.order {
            SortOrder::OldestFirst => sql.push_str(&format!(" ORDER BY {date_col} ASC, id ASC")),
            SortOrder::NewestFirst => sql.push_str(&format!(" ORDER BY {date_col} DESC, id DESC")),
        }

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| decode_row(resource, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert(&self, record: Record) -> Result<Record, StoreError> {
        self.insert_sync(&record)
    }

    async fn select(&self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        self.select_sync(query)
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn columns(resource: Resource) -> &'static str {
    match resource {
        Resource::Expenses => EXPENSE_COLUMNS,
        Resource::Revenues => REVENUE_COLUMNS,
        Resource::Investments => INVESTMENT_COLUMNS,
        Resource::Overtime => OVERTIME_COLUMNS,
    }
}

fn decode_row(resource: Resource, row: &Row<'_>) -> rusqlite::Result<Record> {
    let id = Some(RecordId::Int(row.get(0)?));
    let record = match resource {
        Resource::Expenses => Record::Expense(Expense {
            id,
            user_id: row.get(1)?,
            value: row.get(2)?,
            category: ExpenseCategory::from_stored(&row.get::<_, String>(3)?),
            payment_method: row.get(4)?,
            description: row.get(5)?,
            date: row.get(6)?,
        }),
        Resource::Revenues => Record::Revenue(Revenue {
            id,
            user_id: row.get(1)?,
            value: row.get(2)?,
            category: RevenueCategory::from_stored(&row.get::<_, String>(3)?),
            description: row.get(4)?,
            date: row.get(5)?,
        }),
        Resource::Investments => Record::Investment(Investment {
            id,
            user_id: row.get(1)?,
            value: row.get(2)?,
            investment_type: InvestmentType::from_stored(&row.get::<_, String>(3)?),
            where_invested: row.get(4)?,
            description: row.get(5)?,
            date: row.get(6)?,
        }),
        Resource::Overtime => Record::Overtime(OvertimeEntry {
            id,
            user_id: row.get(1)?,
            hourly_rate: row.get(2)?,
            overtime_percentage: row.get(3)?,
            start_time: row.get(4)?,
            end_time: row.get(5)?,
            payment_date: row.get(6)?,
            total_value: row.get(7)?,
        }),
    };
    Ok(record)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_store() -> SqliteStore {
        SqliteStore::open(":memory:").expect("in-memory store should open")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn expense(user: &str, value: f64, category: ExpenseCategory, date: NaiveDate) -> Record {
        Record::Expense(Expense {
            id: None,
            user_id: user.into(),
            value,
            category,
            payment_method: Some("pix".into()),
            description: Some(format!("gasto {value}")),
            date,
        })
    }

    #[tokio::test]
    async fn insert_reads_back_with_id() {
        let store = test_store();
        let stored = store
            .insert(expense("u1", 25.0, ExpenseCategory::Food, day(16)))
            .await
            .unwrap();

        assert_eq!(stored.id(), Some(&RecordId::Int(1)));
        match stored {
            Record::Expense(e) => {
                assert_eq!(e.value, 25.0);
                assert_eq!(e.category, ExpenseCategory::Food);
                assert_eq!(e.payment_method.as_deref(), Some("pix"));
                assert_eq!(e.date, day(16));
            }
            other => panic!("expected expense, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn select_filters_user_range_and_category() {
        let store = test_store();
        store.insert(expense("u1", 10.0, ExpenseCategory::Food, day(1))).await.unwrap();
        store.insert(expense("u1", 20.0, ExpenseCategory::Transport, day(10))).await.unwrap();
        store.insert(expense("u1", 30.0, ExpenseCategory::Food, day(20))).await.unwrap();
        store.insert(expense("u2", 99.0, ExpenseCategory::Food, day(10))).await.unwrap();

        let all = store
            .select(&RecordQuery::new(Resource::Expenses, "u1", day(1), day(31)))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date(), day(1));

        let ranged = store
            .select(&RecordQuery::new(Resource::Expenses, "u1", day(2), day(20)))
            .await
            .unwrap();
        assert_eq!(ranged.len(), 2, "range bounds are inclusive");

        let food = store
            .select(
                &RecordQuery::new(Resource::Expenses, "u1", day(1), day(31))
                    .with_category(Some("food".into())),
            )
            .await
            .unwrap();
        assert_eq!(food.iter().map(Record::amount).sum::<f64>(), 40.0);
    }

    #[tokio::test]
    async fn select_newest_first_with_limit() {
        let store = test_store();
        for d in 1..=5 {
            store
                .insert(expense("u1", d as f64, ExpenseCategory::Other, day(d)))
                .await
                .unwrap();
        }

        let rows = store
            .select(
                &RecordQuery::new(Resource::Expenses, "u1", day(1), day(31))
                    .newest_first()
                    .with_limit(2),
            )
            .await
            .unwrap();
        let dates: Vec<_> = rows.iter().map(Record::date).collect();
        assert_eq!(dates, vec![day(5), day(4)]);
    }

    #[tokio::test]
    async fn overtime_roundtrip_filters_on_payment_date() {
        let store = test_store();
        let start = day(2).and_hms_opt(18, 0, 0).unwrap();
        let end = day(2).and_hms_opt(20, 0, 0).unwrap();
        store
            .insert(Record::Overtime(OvertimeEntry {
                id: None,
                user_id: "u1".into(),
                hourly_rate: 30.0,
                overtime_percentage: 1.0,
                start_time: start,
                end_time: end,
                payment_date: day(5),
                total_value: Some(120.0),
            }))
            .await
            .unwrap();

        let hit = store
            .select(
                &RecordQuery::new(Resource::Overtime, "u1", day(5), day(5))
                    .with_category(Some("food".into())),
            )
            .await
            .unwrap();
        assert_eq!(hit.len(), 1, "category filter is ignored for overtime");
        assert_eq!(hit[0].amount(), 120.0);
        match &hit[0] {
            Record::Overtime(o) => assert_eq!(o.start_time, start),
            other => panic!("expected overtime, got {other:?}"),
        }

        let miss = store
            .select(&RecordQuery::new(Resource::Overtime, "u1", day(1), day(4)))
            .await
            .unwrap();
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn investments_filter_on_investment_type() {
        let store = test_store();
        for (value, kind) in [(100.0, InvestmentType::Crypto), (200.0, InvestmentType::FixedIncome)] {
            store
                .insert(Record::Investment(Investment {
                    id: None,
                    user_id: "u1".into(),
                    value,
                    investment_type: kind,
                    where_invested: "Nubank".into(),
                    description: None,
                    date: day(3),
                }))
                .await
                .unwrap();
        }

        let rows = store
            .select(
                &RecordQuery::new(Resource::Investments, "u1", day(1), day(31))
                    .with_category(Some("crypto".into())),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount(), 100.0);
    }
}
