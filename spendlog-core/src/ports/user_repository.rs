//! Credential store port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{User, UserId};

/// Persistence of user records.
///
/// Implementations must enforce email uniqueness atomically at write time
/// and report a violation as `Error::EmailAlreadyExists`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Exact, case-sensitive lookup
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn email_exists(&self, email: &str) -> Result<bool>;
}
