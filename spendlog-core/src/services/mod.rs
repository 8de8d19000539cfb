//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod auth;
mod expense;
pub mod migration;
pub mod password;
pub mod token;

pub use auth::AuthService;
pub use expense::ExpenseService;
pub use migration::{MigrationResult, MigrationService};
pub use password::PasswordHasher;
pub use token::TokenService;
