use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    domain::{Category, EntryId, ExpenseEntry, NewExpense, SubcategoryTotal, UserId},
    errors::Error,
    ledger::LedgerStore,
    Result,
};

#[derive(Debug, Default)]
struct Rows {
    next_id: i64,
    entries: Vec<ExpenseEntry>,
}

/// Volatile ledger kept in process memory.
///
/// Used for local runs (`DATABASE_URL=memory:`) and as the store behind the
/// dialogue and dispatcher tests. Ids are assigned from 1 upward and never reused.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    rows: Mutex<Rows>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a user's entries in insertion order.
    pub fn entries_for(&self, user_id: UserId) -> Result<Vec<ExpenseEntry>> {
        Ok(self
            .lock()?
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rows>> {
        self.rows
            .lock()
            .map_err(|_| Error::storage("in-memory ledger lock poisoned"))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn insert(&self, expense: NewExpense) -> Result<EntryId> {
        let mut rows = self.lock()?;
        rows.next_id += 1;
        let id = EntryId(rows.next_id);
        rows.entries.push(ExpenseEntry {
            id,
            user_id: expense.user_id,
            category: expense.category,
            subcategory: expense.subcategory,
            amount: expense.amount,
            label: expense.label,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn delete_most_recent(&self, user_id: UserId) -> Result<Option<ExpenseEntry>> {
        let mut rows = self.lock()?;
        let newest = rows
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.user_id == user_id)
            .max_by_key(|(_, e)| e.id)
            .map(|(idx, _)| idx);
        Ok(newest.map(|idx| rows.entries.remove(idx)))
    }

    async fn delete_all(&self, user_id: UserId) -> Result<u64> {
        let mut rows = self.lock()?;
        let before = rows.entries.len();
        rows.entries.retain(|e| e.user_id != user_id);
        Ok((before - rows.entries.len()) as u64)
    }

    async fn summarize(
        &self,
        user_id: UserId,
        category: Category,
    ) -> Result<Vec<SubcategoryTotal>> {
        let rows = self.lock()?;
        let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
        for e in rows
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.category == category)
        {
            *sums.entry(e.subcategory.as_str()).or_default() += e.amount;
        }
        Ok(sums
            .into_iter()
            .map(|(subcategory, total)| SubcategoryTotal {
                subcategory: subcategory.to_string(),
                total,
            })
            .collect())
    }
}
