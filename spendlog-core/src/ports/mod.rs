//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod expense_repository;
mod user_repository;

pub use expense_repository::ExpenseRepository;
pub use user_repository::UserRepository;
