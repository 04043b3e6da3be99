//! PostgreSQL ledger adapter (sqlx).
//!
//! Implements the `etb-core` LedgerStore port over a pooled connection. Each
//! operation is a single statement, so a failure never leaves a partial write,
//! and pooled connections go back to the pool on every exit path.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{error, info};

use etb_core::{
    domain::{Category, EntryId, ExpenseEntry, NewExpense, SubcategoryTotal, UserId},
    errors::Error,
    ledger::LedgerStore,
    Result,
};

/// Table layout. Safe to run on every start.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id SERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    category TEXT NOT NULL,
    subcategory TEXT NOT NULL,
    amount NUMERIC(10,2) NOT NULL,
    label TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

const INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_category ON expenses (user_id, category)";

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: i64,
    user_id: i64,
    category: String,
    subcategory: String,
    amount: Decimal,
    label: Option<String>,
    created_at: Option<NaiveDateTime>,
}

impl TryFrom<ExpenseRow> for ExpenseEntry {
    type Error = Error;

    fn try_from(row: ExpenseRow) -> Result<Self> {
        let category = row.category.parse::<Category>().map_err(Error::storage)?;
        Ok(ExpenseEntry {
            id: EntryId(row.id),
            user_id: UserId(row.user_id),
            category,
            subcategory: row.subcategory,
            amount: row.amount,
            label: row.label,
            created_at: row.created_at.unwrap_or_default().and_utc(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct TotalRow {
    subcategory: String,
    total: Decimal,
}

/// Thread-safe ledger handle; clones share the pool.
#[derive(Clone, Debug)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    /// Connect and make sure the table exists.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await
            .map_err(|e| map_err("connect", e))?;
        let ledger = Self { pool };
        ledger.ensure_schema().await?;
        info!(max_connections, "postgres ledger ready");
        Ok(ledger)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("create table", e))?;
        sqlx::query(INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("create index", e))?;
        Ok(())
    }
}

fn map_err(op: &str, e: sqlx::Error) -> Error {
    error!(op, error = %e, "postgres ledger error");
    Error::storage(format!("{op}: {e}"))
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn insert(&self, expense: NewExpense) -> Result<EntryId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO expenses (user_id, category, subcategory, amount, label)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id::BIGINT",
        )
        .bind(expense.user_id.0)
        .bind(expense.category.as_str())
        .bind(&expense.subcategory)
        .bind(expense.amount)
        .bind(expense.label.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err("insert", e))?;
        Ok(EntryId(id))
    }

    async fn delete_most_recent(&self, user_id: UserId) -> Result<Option<ExpenseEntry>> {
        // Select and delete in one statement; "most recent" is the highest id.
        let row: Option<ExpenseRow> = sqlx::query_as(
            "DELETE FROM expenses
             WHERE id = (
                 SELECT id FROM expenses WHERE user_id = $1 ORDER BY id DESC LIMIT 1
             )
             RETURNING id::BIGINT AS id, user_id, category, subcategory, amount, label, created_at",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_err("delete most recent", e))?;
        row.map(ExpenseEntry::try_from).transpose()
    }

    async fn delete_all(&self, user_id: UserId) -> Result<u64> {
        let done = sqlx::query("DELETE FROM expenses WHERE user_id = $1")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("delete all", e))?;
        Ok(done.rows_affected())
    }

    async fn summarize(
        &self,
        user_id: UserId,
        category: Category,
    ) -> Result<Vec<SubcategoryTotal>> {
        let rows: Vec<TotalRow> = sqlx::query_as(
            "SELECT subcategory, SUM(amount) AS total
             FROM expenses
             WHERE user_id = $1 AND category = $2
             GROUP BY subcategory
             ORDER BY subcategory",
        )
        .bind(user_id.0)
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err("summarize", e))?;

        Ok(rows
            .into_iter()
            .map(|r| SubcategoryTotal {
                subcategory: r.subcategory,
                total: r.total,
            })
            .collect())
    }
}
