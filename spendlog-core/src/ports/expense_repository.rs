//! Expense store port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{
    AggregationWindow, Expense, ExpenseAggregate, ExpenseFilter, ExpenseId, ExpensePage, UserId,
};

/// Persistence of expense records.
///
/// Every read and write is scoped by owner. A record owned by someone else
/// is indistinguishable from a missing one.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn create_expense(&self, expense: &Expense) -> Result<()>;

    async fn find_expense(&self, id: ExpenseId, owner: UserId) -> Result<Option<Expense>>;

    /// Filtered page ordered by date desc, then creation time desc.
    /// `total` counts the filtered set before limit/offset.
    async fn find_expenses(&self, filter: &ExpenseFilter) -> Result<ExpensePage>;

    /// Overwrite the mutable fields of an existing record
    async fn save_expense(&self, expense: &Expense) -> Result<()>;

    /// Returns false when no record of `owner` had that ID
    async fn delete_expense(&self, id: ExpenseId, owner: UserId) -> Result<bool>;

    /// Sum, count and breakdowns over every expense of `owner` dated inside `window`
    async fn aggregate_expenses(
        &self,
        owner: UserId,
        window: &AggregationWindow,
    ) -> Result<ExpenseAggregate>;
}
