//! Ledger Store port: durable expense entries partitioned by user.

pub mod memory;

use async_trait::async_trait;

use crate::{
    domain::{Category, EntryId, ExpenseEntry, NewExpense, SubcategoryTotal, UserId},
    Result,
};

/// Hexagonal port for expense persistence.
///
/// Every method may suspend on I/O. Any backend fault surfaces as
/// `Error::StorageUnavailable` and leaves stored rows unchanged.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persist one entry; the store assigns `id` and `created_at`.
    async fn insert(&self, expense: NewExpense) -> Result<EntryId>;

    /// Remove and return the user's entry with the highest id.
    async fn delete_most_recent(&self, user_id: UserId) -> Result<Option<ExpenseEntry>>;

    /// Remove every entry for the user and return how many were removed.
    async fn delete_all(&self, user_id: UserId) -> Result<u64>;

    /// Sum amounts per subcategory for one category, ordered by subcategory
    /// name. Subcategories without entries are omitted.
    async fn summarize(&self, user_id: UserId, category: Category)
        -> Result<Vec<SubcategoryTotal>>;
}
