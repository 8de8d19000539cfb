//! DuckDB repository implementation

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::{params, params_from_iter, Connection};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AggregationWindow, Category, CategoryTotal, DailyTotal, Expense, ExpenseAggregate,
    ExpenseFilter, ExpenseId, ExpensePage, User, UserId, DATE_FORMAT,
};
use crate::ports::{ExpenseRepository, UserRepository};
use crate::services::{MigrationResult, MigrationService};

const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const USER_COLUMNS: &str = "user_id, name, email, password_hash,
     created_at::VARCHAR, updated_at::VARCHAR";

const EXPENSE_COLUMNS: &str = "expense_id, user_id, amount::VARCHAR, category,
     expense_date::VARCHAR, note, created_at::VARCHAR, updated_at::VARCHAR";

/// DuckDB repository implementation
///
/// A single connection is shared behind a mutex. Every method takes the
/// lock for the duration of one statement sequence and never awaits while
/// holding it.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
}

impl DuckDbRepository {
    /// Open (or create) the database file at `db_path`
    pub fn new(db_path: &Path) -> Result<Self> {
        // Extension autoloading stays off, nothing here needs one
        let config = duckdb::Config::default()
            .enable_autoload_extension(false)
            .map_err(db_err)?;
        let conn = Connection::open_with_flags(db_path, config).map_err(|e| {
            Error::database(format!("failed to open {}: {}", db_path.display(), e))
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::database("connection lock poisoned"))
    }
}

// === Row mapping ===

struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_user(self) -> Result<User> {
        Ok(User {
            id: parse_id(&self.id)?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct ExpenseRow {
    id: String,
    user_id: String,
    amount: String,
    category: String,
    date: String,
    note: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ExpenseRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            category: row.get(3)?,
            date: row.get(4)?,
            note: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_expense(self) -> Result<Expense> {
        Ok(Expense {
            id: parse_id(&self.id)?,
            user_id: parse_id(&self.user_id)?,
            amount: parse_decimal(&self.amount)?,
            category: parse_category(&self.category)?,
            date: parse_stored_date(&self.date)?,
            note: self.note,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

// === Users ===

#[async_trait]
impl UserRepository for DuckDbRepository {
    async fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (user_id, name, email, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.password_hash,
                format_timestamp(&user.created_at),
                format_timestamp(&user.updated_at),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::EmailAlreadyExists
            } else {
                db_err(e)
            }
        })?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt
            .query_map([email], UserRow::read)
            .map_err(db_err)?;
        rows.next()
            .transpose()
            .map_err(db_err)?
            .map(UserRow::into_user)
            .transpose()
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt
            .query_map([id.to_string()], UserRow::read)
            .map_err(db_err)?;
        rows.next()
            .transpose()
            .map_err(db_err)?
            .map(UserRow::into_user)
            .transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users WHERE email = ?", [email], |row| {
                row.get(0)
            })
            .map_err(db_err)?;
        Ok(count > 0)
    }
}

// === Expenses ===

#[async_trait]
impl ExpenseRepository for DuckDbRepository {
    async fn create_expense(&self, expense: &Expense) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO expenses (expense_id, user_id, amount, category, expense_date, note,
                                   created_at, updated_at)
             VALUES (?, ?, CAST(? AS DECIMAL(15, 2)), ?, CAST(? AS DATE), ?,
                     CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))",
            params![
                expense.id.to_string(),
                expense.user_id.to_string(),
                expense.amount.to_string(),
                expense.category.as_str(),
                expense.date.format(DATE_FORMAT).to_string(),
                expense.note,
                format_timestamp(&expense.created_at),
                format_timestamp(&expense.updated_at),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_expense(&self, id: ExpenseId, owner: UserId) -> Result<Option<Expense>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM expenses WHERE expense_id = ? AND user_id = ?",
            EXPENSE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt
            .query_map([id.to_string(), owner.to_string()], ExpenseRow::read)
            .map_err(db_err)?;
        rows.next()
            .transpose()
            .map_err(db_err)?
            .map(ExpenseRow::into_expense)
            .transpose()
    }

    async fn find_expenses(&self, filter: &ExpenseFilter) -> Result<ExpensePage> {
        let mut clauses = vec!["user_id = ?"];
        let mut args = vec![filter.user_id.to_string()];
        if let Some(start) = filter.start_date {
            clauses.push("expense_date >= CAST(? AS DATE)");
            args.push(start.format(DATE_FORMAT).to_string());
        }
        if let Some(end) = filter.end_date {
            clauses.push("expense_date <= CAST(? AS DATE)");
            args.push(end.format(DATE_FORMAT).to_string());
        }
        if let Some(category) = &filter.category {
            clauses.push("category = ?");
            args.push(category.clone());
        }
        let where_clause = clauses.join(" AND ");

        let conn = self.lock()?;

        let count_sql = format!("SELECT COUNT(*) FROM expenses WHERE {}", where_clause);
        let total: i64 = conn
            .query_row(&count_sql, params_from_iter(args.iter()), |row| row.get(0))
            .map_err(db_err)?;

        let page_sql = format!(
            "SELECT {} FROM expenses WHERE {}
             ORDER BY expense_date DESC, created_at DESC, expense_id DESC
             LIMIT {} OFFSET {}",
            EXPENSE_COLUMNS, where_clause, filter.limit, filter.offset
        );
        let mut stmt = conn.prepare(&page_sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), ExpenseRow::read)
            .map_err(db_err)?;

        let mut expenses = Vec::new();
        for row in rows {
            expenses.push(row.map_err(db_err)?.into_expense()?);
        }

        Ok(ExpensePage {
            expenses,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn save_expense(&self, expense: &Expense) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE expenses
                 SET amount = CAST(? AS DECIMAL(15, 2)), category = ?,
                     expense_date = CAST(? AS DATE), note = ?,
                     updated_at = CAST(? AS TIMESTAMP)
                 WHERE expense_id = ? AND user_id = ?",
                params![
                    expense.amount.to_string(),
                    expense.category.as_str(),
                    expense.date.format(DATE_FORMAT).to_string(),
                    expense.note,
                    format_timestamp(&expense.updated_at),
                    expense.id.to_string(),
                    expense.user_id.to_string(),
                ],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Err(Error::not_found("Expense"));
        }
        Ok(())
    }

    async fn delete_expense(&self, id: ExpenseId, owner: UserId) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "DELETE FROM expenses WHERE expense_id = ? AND user_id = ?",
                [id.to_string(), owner.to_string()],
            )
            .map_err(db_err)?;
        Ok(deleted > 0)
    }

    async fn aggregate_expenses(
        &self,
        owner: UserId,
        window: &AggregationWindow,
    ) -> Result<ExpenseAggregate> {
        let args = [
            owner.to_string(),
            window.start_date().format(DATE_FORMAT).to_string(),
            window.end_date().format(DATE_FORMAT).to_string(),
        ];
        let scope = "user_id = ? AND expense_date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)";

        let conn = self.lock()?;

        let (total, count): (String, i64) = conn
            .query_row(
                &format!(
                    "SELECT COALESCE(SUM(amount), 0)::VARCHAR, COUNT(*) FROM expenses WHERE {}",
                    scope
                ),
                params_from_iter(args.iter()),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(db_err)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT category, SUM(amount)::VARCHAR, COUNT(*) FROM expenses WHERE {}
                 GROUP BY category
                 ORDER BY SUM(amount) DESC, category ASC",
                scope
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(db_err)?;
        let mut by_category = Vec::new();
        for row in rows {
            let (category, sum, n) = row.map_err(db_err)?;
            by_category.push(CategoryTotal {
                category: parse_category(&category)?,
                total: parse_decimal(&sum)?,
                count: u64::try_from(n).unwrap_or_default(),
            });
        }

        let mut stmt = conn
            .prepare(&format!(
                "SELECT expense_date::VARCHAR, SUM(amount)::VARCHAR FROM expenses WHERE {}
                 GROUP BY expense_date
                 ORDER BY expense_date ASC",
                scope
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(db_err)?;
        let mut daily = Vec::new();
        for row in rows {
            let (date, sum) = row.map_err(db_err)?;
            daily.push(DailyTotal {
                date: parse_stored_date(&date)?,
                total: parse_decimal(&sum)?,
            });
        }

        Ok(ExpenseAggregate {
            total: parse_decimal(&total)?,
            count: u64::try_from(count).unwrap_or_default(),
            by_category,
            daily,
        })
    }
}

// Helper functions

fn db_err(e: duckdb::Error) -> Error {
    Error::database(e.to_string())
}

/// DuckDB reports both UNIQUE and PRIMARY KEY violations as constraint errors
fn is_unique_violation(e: &duckdb::Error) -> bool {
    let msg = e.to_string().to_lowercase();
    msg.contains("duplicate key") || msg.contains("unique constraint")
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format(TIMESTAMP_WRITE_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_READ_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::database(format!("bad stored timestamp {:?}: {}", s, e)))
}

fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| Error::database(format!("bad stored date {:?}: {}", s, e)))
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| Error::database(format!("bad stored amount {:?}: {}", s, e)))
}

fn parse_category(s: &str) -> Result<Category> {
    Category::from_str(s).map_err(|_| Error::database(format!("bad stored category {:?}", s)))
}

fn parse_id<T: FromStr>(s: &str) -> Result<T> {
    s.parse()
        .map_err(|_| Error::database(format!("bad stored id {:?}", s)))
}
