//! User domain model

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ids::UserId;
use super::result::{Error, Result};

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 6;
/// Password bounds count characters, not bytes.
/// The upper one keeps a single request from feeding the hasher megabytes.
pub const MAX_PASSWORD_LEN: usize = 1024;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$";

/// A registered user as held by the credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password_hash: String) -> Self {
        let now = super::now();
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Outward view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Result of a successful register or login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResult {
    pub user: PublicUser,
    pub token: String,
}

/// Registration input
#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RegisterRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check name, email and password policy
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
        return Err(Error::validation(format!(
            "name must be between {} and {} characters",
            MIN_NAME_LEN, MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// Syntactic email check. Uniqueness is the store's job.
pub fn validate_email(email: &str) -> Result<()> {
    if email.len() > MAX_EMAIL_LEN || !email_pattern()?.is_match(email) {
        return Err(Error::validation("email address is not valid"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn email_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = PATTERN.get() {
        return Ok(re);
    }
    let re = Regex::new(EMAIL_PATTERN).map_err(|e| Error::Config(e.to_string()))?;
    Ok(PATTERN.get_or_init(|| re))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_view_has_no_hash() {
        let user = User::new("Alice", "alice@example.com", "$argon2id$secret".to_string());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password"));

        let public = user.to_public();
        assert_eq!(public.id, user.id);
        assert_eq!(public.email, "alice@example.com");
    }

    #[test]
    fn test_register_request_validation() {
        assert!(RegisterRequest::new("Al", "al@example.com", "secret").validate().is_ok());
        assert!(RegisterRequest::new("A", "a@example.com", "secret").validate().is_err());
        assert!(RegisterRequest::new("x".repeat(101), "a@example.com", "secret")
            .validate()
            .is_err());
        assert!(RegisterRequest::new("Alice", "not-an-email", "secret").validate().is_err());
        assert!(RegisterRequest::new("Alice", "alice@example.com", "12345").validate().is_err());
    }

    #[test]
    fn test_password_bounds_count_characters() {
        let register = |password: String| {
            RegisterRequest::new("Alice", "alice@example.com", password).validate()
        };
        // Six two-byte characters meet the minimum
        assert!(register("ééééé".to_string()).is_err());
        assert!(register("éééééé".to_string()).is_ok());
        // 1024 characters is 2048 bytes here and still fits
        assert!(register("é".repeat(MAX_PASSWORD_LEN)).is_ok());
        assert!(register("é".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }

    #[test]
    fn test_email_syntax() {
        assert!(validate_email("user.name+tag@mail.example.co.id").is_ok());
        assert!(validate_email("user@localhost").is_err());
        assert!(validate_email("user@@example.com").is_err());
        assert!(validate_email("us er@example.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let req = RegisterRequest::new("Alice", "alice@example.com", "hunter22");
        let printed = format!("{:?}", req);
        assert!(!printed.contains("hunter22"));
    }
}
