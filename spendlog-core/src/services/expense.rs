//! Expense service - owner-scoped CRUD and statistics

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use crate::domain::result::{Error, Result};
use crate::domain::{
    Expense, ExpenseFilter, ExpenseId, ExpensePage, ExpensePatch, ExpenseStats, NewExpense,
    StatsPeriod, UserId,
};
use crate::ports::ExpenseRepository;

/// Expense service. Every method takes the owner and passes it to the store.
pub struct ExpenseService {
    expenses: Arc<dyn ExpenseRepository>,
}

impl ExpenseService {
    pub fn new(expenses: Arc<dyn ExpenseRepository>) -> Self {
        Self { expenses }
    }

    /// Validate and record a new expense for `owner`
    #[instrument(skip(self, input), fields(user_id = %owner))]
    pub async fn create(&self, owner: UserId, input: NewExpense) -> Result<Expense> {
        let expense = input.into_expense(owner)?;
        self.expenses.create_expense(&expense).await?;
        info!(expense_id = %expense.id, "expense created");
        Ok(expense)
    }

    /// Another owner's record is reported exactly like a missing one
    #[instrument(skip(self), fields(user_id = %owner))]
    pub async fn get_by_id(&self, id: ExpenseId, owner: UserId) -> Result<Expense> {
        self.expenses
            .find_expense(id, owner)
            .await?
            .ok_or_else(|| Error::not_found("Expense"))
    }

    /// Filtered, paginated listing. Limit and offset are taken as given.
    #[instrument(skip(self, filter), fields(user_id = %filter.user_id))]
    pub async fn get_all(&self, filter: &ExpenseFilter) -> Result<ExpensePage> {
        let page = self.expenses.find_expenses(filter).await?;
        debug!(returned = page.expenses.len(), total = page.total, "expenses listed");
        Ok(page)
    }

    /// Apply the supplied fields. `updated_at` moves even for an empty patch.
    #[instrument(skip(self, patch), fields(user_id = %owner))]
    pub async fn update(
        &self,
        id: ExpenseId,
        owner: UserId,
        patch: ExpensePatch,
    ) -> Result<Expense> {
        let mut expense = self.get_by_id(id, owner).await?;
        patch.apply_to(&mut expense)?;
        self.expenses.save_expense(&expense).await?;
        info!("expense updated");
        Ok(expense)
    }

    #[instrument(skip(self), fields(user_id = %owner))]
    pub async fn delete(&self, id: ExpenseId, owner: UserId) -> Result<()> {
        self.get_by_id(id, owner).await?;
        if !self.expenses.delete_expense(id, owner).await? {
            return Err(Error::not_found("Expense"));
        }
        info!("expense deleted");
        Ok(())
    }

    /// Statistics for the window of `period` around the local wall clock
    pub async fn get_stats(&self, owner: UserId, period: StatsPeriod) -> Result<ExpenseStats> {
        self.get_stats_at(owner, period, chrono::Local::now().naive_local())
            .await
    }

    /// Statistics for the window of `period` that contains `now`
    #[instrument(skip(self), fields(user_id = %owner))]
    pub async fn get_stats_at(
        &self,
        owner: UserId,
        period: StatsPeriod,
        now: NaiveDateTime,
    ) -> Result<ExpenseStats> {
        let window = period.window_at(now);
        let aggregate = self.expenses.aggregate_expenses(owner, &window).await?;
        debug!(count = aggregate.count, "stats aggregated");
        Ok(ExpenseStats::new(period, window, aggregate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use crate::domain::result::{ErrorKind, OperationResult, INTERNAL_ERROR_MESSAGE};
    use crate::domain::{AggregationWindow, ExpenseAggregate};

    const DISK_FAILURE: &str = "IO Error: could not read block 42 of spendlog.duckdb";

    /// Store whose every call fails like a broken disk
    struct BrokenStore;

    #[async_trait]
    impl ExpenseRepository for BrokenStore {
        async fn create_expense(&self, _: &Expense) -> Result<()> {
            Err(Error::database(DISK_FAILURE))
        }
        async fn find_expense(&self, _: ExpenseId, _: UserId) -> Result<Option<Expense>> {
            Err(Error::database(DISK_FAILURE))
        }
        async fn find_expenses(&self, _: &ExpenseFilter) -> Result<ExpensePage> {
            Err(Error::database(DISK_FAILURE))
        }
        async fn save_expense(&self, _: &Expense) -> Result<()> {
            Err(Error::database(DISK_FAILURE))
        }
        async fn delete_expense(&self, _: ExpenseId, _: UserId) -> Result<bool> {
            Err(Error::database(DISK_FAILURE))
        }
        async fn aggregate_expenses(
            &self,
            _: UserId,
            _: &AggregationWindow,
        ) -> Result<ExpenseAggregate> {
            Err(Error::database(DISK_FAILURE))
        }
    }

    fn service() -> ExpenseService {
        ExpenseService::new(Arc::new(BrokenStore))
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_and_opaque() {
        let owner = UserId::new();
        let input = NewExpense::new(
            Decimal::from_str("12.50").unwrap(),
            "makanan",
            "2024-03-01",
            None,
        );

        let err = service().create(owner, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);

        let envelope = OperationResult::<Expense>::from(
            service().get_by_id(ExpenseId::new(), owner).await,
        );
        assert!(!envelope.success);
        let shown = envelope.error.unwrap();
        assert_eq!(shown, INTERNAL_ERROR_MESSAGE);
        assert!(!shown.contains("block 42"));
    }

    #[tokio::test]
    async fn test_validation_runs_before_the_store() {
        let input = NewExpense::new(Decimal::ZERO, "makanan", "2024-03-01", None);
        let err = service().create(UserId::new(), input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_stats_failure_propagates() {
        let err = service()
            .get_stats(UserId::new(), StatsPeriod::Week)
            .await
            .unwrap_err();
        assert!(err.is_internal());
    }
}
