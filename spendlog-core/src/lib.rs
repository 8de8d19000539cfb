//! Spendlog Core - Business logic for personal expense tracking
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, Expense, ExpenseStats, etc.)
//! - **ports**: Trait definitions for the credential and expense stores
//! - **services**: Business logic orchestration (auth, expenses, hashing, tokens)
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbRepository;
use adapters::memory::InMemoryRepository;
use config::Config;
use ports::{ExpenseRepository, UserRepository};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, ErrorKind, OperationResult};
pub use domain::{
    AuthResult, Category, Expense, ExpenseFilter, ExpenseId, ExpensePage, ExpensePatch,
    ExpenseQuery, ExpenseStats, NewExpense, PublicUser, QueryLimits, RegisterRequest,
    StatsPeriod, User, UserId,
};

/// Database file inside the data directory
pub const DB_FILENAME: &str = "spendlog.duckdb";

/// Main context for Spendlog operations
///
/// This is the primary entry point for all business logic. It holds the
/// configuration and both services, wired over one shared store.
pub struct SpendlogContext {
    pub config: Config,
    pub auth_service: AuthService,
    pub expense_service: ExpenseService,
}

impl SpendlogContext {
    /// Open the data directory, migrate its database and wire the services
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let config = Config::load(data_dir).context("Failed to load settings")?;

        let db_path = data_dir.join(DB_FILENAME);
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);
        repository
            .ensure_schema()
            .context("Failed to migrate database")?;

        Self::wire(config, repository)
    }

    /// Same services over a fresh in-memory store
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::wire(config, Arc::new(InMemoryRepository::new()))
    }

    fn wire<R>(config: Config, repository: Arc<R>) -> Result<Self>
    where
        R: UserRepository + ExpenseRepository + 'static,
    {
        let users: Arc<dyn UserRepository> = repository.clone();
        let expenses: Arc<dyn ExpenseRepository> = repository;

        let auth_service =
            AuthService::new(users, &config.auth_config()).context("Invalid auth settings")?;
        let expense_service = ExpenseService::new(expenses);

        Ok(Self {
            config,
            auth_service,
            expense_service,
        })
    }
}
