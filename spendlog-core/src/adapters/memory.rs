//! In-memory repository, used by tests and ephemeral sessions

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AggregationWindow, CategoryTotal, DailyTotal, Expense, ExpenseAggregate, ExpenseFilter,
    ExpenseId, ExpensePage, User, UserId,
};
use crate::ports::{ExpenseRepository, UserRepository};

/// Process-local store implementing both repository ports
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<UserId, User>>,
    expenses: RwLock<HashMap<ExpenseId, Expense>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
        lock.read().map_err(|_| Error::database("store lock poisoned"))
    }

    fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
        lock.write().map_err(|_| Error::database("store lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut users = Self::write(&self.users)?;
        // Check and insert under one write lock, like a unique index
        if users.values().any(|u| u.email == user.email) || users.contains_key(&user.id) {
            return Err(Error::EmailAlreadyExists);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = Self::read(&self.users)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let users = Self::read(&self.users)?;
        Ok(users.get(&id).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let users = Self::read(&self.users)?;
        Ok(users.values().any(|u| u.email == email))
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryRepository {
    async fn create_expense(&self, expense: &Expense) -> Result<()> {
        let mut expenses = Self::write(&self.expenses)?;
        if expenses.contains_key(&expense.id) {
            return Err(Error::database(format!("duplicate expense id {}", expense.id)));
        }
        expenses.insert(expense.id, expense.clone());
        Ok(())
    }

    async fn find_expense(&self, id: ExpenseId, owner: UserId) -> Result<Option<Expense>> {
        let expenses = Self::read(&self.expenses)?;
        Ok(expenses.get(&id).filter(|e| e.user_id == owner).cloned())
    }

    async fn find_expenses(&self, filter: &ExpenseFilter) -> Result<ExpensePage> {
        let expenses = Self::read(&self.expenses)?;
        let mut matched: Vec<&Expense> = expenses.values().filter(|e| filter.matches(e)).collect();
        matched.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();

        Ok(ExpensePage {
            expenses: page,
            total,
        })
    }

    async fn save_expense(&self, expense: &Expense) -> Result<()> {
        let mut expenses = Self::write(&self.expenses)?;
        match expenses.get_mut(&expense.id) {
            Some(stored) if stored.user_id == expense.user_id => {
                // Owner and creation time never change
                stored.amount = expense.amount;
                stored.category = expense.category;
                stored.date = expense.date;
                stored.note = expense.note.clone();
                stored.updated_at = expense.updated_at;
                Ok(())
            }
            _ => Err(Error::not_found("Expense")),
        }
    }

    async fn delete_expense(&self, id: ExpenseId, owner: UserId) -> Result<bool> {
        let mut expenses = Self::write(&self.expenses)?;
        if expenses.get(&id).is_some_and(|e| e.user_id == owner) {
            expenses.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn aggregate_expenses(
        &self,
        owner: UserId,
        window: &AggregationWindow,
    ) -> Result<ExpenseAggregate> {
        let expenses = Self::read(&self.expenses)?;
        let mut aggregate = ExpenseAggregate::default();
        let mut by_category: HashMap<_, CategoryTotal> = HashMap::new();
        let mut daily: HashMap<_, DailyTotal> = HashMap::new();

        for expense in expenses
            .values()
            .filter(|e| e.user_id == owner && window.contains(e.date))
        {
            aggregate.total += expense.amount;
            aggregate.count += 1;

            let entry = by_category
                .entry(expense.category)
                .or_insert_with(|| CategoryTotal {
                    category: expense.category,
                    total: Default::default(),
                    count: 0,
                });
            entry.total += expense.amount;
            entry.count += 1;

            daily
                .entry(expense.date)
                .or_insert_with(|| DailyTotal {
                    date: expense.date,
                    total: Default::default(),
                })
                .total += expense.amount;
        }

        aggregate.by_category = by_category.into_values().collect();
        aggregate.daily = daily.into_values().collect();
        aggregate.sort();
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::{NewExpense, StatsPeriod};

    fn expense(owner: UserId, amount: &str, category: &str, date: &str) -> Expense {
        NewExpense::new(Decimal::from_str(amount).unwrap(), category, date, None)
            .into_expense(owner)
            .unwrap()
    }

    #[tokio::test]
    async fn test_email_unique_at_write() {
        let repo = InMemoryRepository::new();
        repo.create_user(&User::new("Ann", "ann@example.com", "h".into()))
            .await
            .unwrap();
        let err = repo
            .create_user(&User::new("Ann Two", "ann@example.com", "h".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let repo = InMemoryRepository::new();
        let owner = UserId::new();
        let stranger = UserId::new();
        let e = expense(owner, "10", "makanan", "2024-03-15");
        repo.create_expense(&e).await.unwrap();

        assert!(repo.find_expense(e.id, stranger).await.unwrap().is_none());
        assert!(!repo.delete_expense(e.id, stranger).await.unwrap());
        assert!(repo.find_expense(e.id, owner).await.unwrap().is_some());
        assert!(repo.delete_expense(e.id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn test_aggregate_window_and_order() {
        let repo = InMemoryRepository::new();
        let owner = UserId::new();
        for (amount, category, date) in [
            ("10.00", "makanan", "2024-03-01"),
            ("5.50", "makanan", "2024-03-03"),
            ("20.00", "transportasi", "2024-03-03"),
            ("99.00", "hiburan", "2024-04-01"),
        ] {
            repo.create_expense(&expense(owner, amount, category, date))
                .await
                .unwrap();
        }

        let now = NaiveDate::from_ymd_opt(2024, 3, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let window = StatsPeriod::Month.window_at(now);
        let agg = repo.aggregate_expenses(owner, &window).await.unwrap();

        assert_eq!(agg.total, Decimal::from_str("35.50").unwrap());
        assert_eq!(agg.count, 3);
        assert_eq!(agg.by_category[0].category.as_str(), "transportasi");
        assert_eq!(agg.by_category[1].count, 2);
        let days: Vec<_> = agg.daily.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(days, vec!["2024-03-01", "2024-03-03"]);
    }
}
