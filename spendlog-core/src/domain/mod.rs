//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod category;
mod expense;
mod ids;
mod password;
mod query;
mod stats;
mod user;
pub mod result;

pub use category::Category;
pub use expense::{
    parse_date, validate_amount, Expense, ExpenseFilter, ExpensePage, ExpensePatch, NewExpense,
    DATE_FORMAT,
};
pub use ids::{ExpenseId, UserId};
pub use password::Argon2Params;
pub use query::{ExpenseQuery, QueryLimits};
pub use stats::{
    AggregationWindow, CategoryTotal, DailyTotal, ExpenseAggregate, ExpenseStats, StatsPeriod,
};
pub use user::{validate_email, AuthResult, PublicUser, RegisterRequest, User};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the microsecond precision the stores keep
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
