//! Result and error types for the core library


use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown to callers for every internal failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Invalid date format, use YYYY-MM-DD: {0}")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used at the transport boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied bad input
    Validation,
    /// Record missing or owned by someone else
    NotFound,
    /// Bad credentials or bad/expired/malformed token
    Authentication,
    /// Duplicate email
    Conflict,
    /// Store, hashing, signing or configuration failure
    Internal,
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not found error for the named entity
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCategory(_)
            | Self::InvalidDate(_)
            | Self::InvalidAmount(_)
            | Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidCredentials | Self::InvalidToken => ErrorKind::Authentication,
            Self::EmailAlreadyExists => ErrorKind::Conflict,
            Self::Database(_)
            | Self::Hashing(_)
            | Self::Token(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Internal,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }

    /// Message safe to show a client.
    ///
    /// Caller errors are returned verbatim; internal errors collapse to
    /// [`INTERNAL_ERROR_MESSAGE`] so store or hashing details never leak.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result envelope handed to the transport layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    /// Create a failed result from an error.
    ///
    /// Internal errors are logged here with full detail; the envelope only
    /// carries the public message.
    pub fn fail(error: &Error) -> Self {
        if error.is_internal() {
            tracing::error!(error = %error, "internal failure");
        }
        Self {
            success: false,
            data: None,
            error: Some(error.public_message()),
            error_kind: Some(error.kind()),
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 42, "error": null}));
    }

    #[test]
    fn test_operation_result_hides_internal_detail() {
        let err: Result<i32> = Err(Error::database("connection reset by peer"));
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(INTERNAL_ERROR_MESSAGE));
        assert_eq!(result.error_kind, Some(ErrorKind::Internal));
    }

    #[test]
    fn test_operation_result_keeps_caller_errors() {
        let err: Result<i32> = Err(Error::InvalidCategory("groceries".to_string()));
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("groceries"));
        assert_eq!(result.error_kind, Some(ErrorKind::Validation));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::not_found("Expense").kind(), ErrorKind::NotFound);
        assert_eq!(Error::InvalidCredentials.kind(), ErrorKind::Authentication);
        assert_eq!(Error::InvalidToken.kind(), ErrorKind::Authentication);
        assert_eq!(Error::EmailAlreadyExists.kind(), ErrorKind::Conflict);
        assert_eq!(Error::Hashing("rng".into()).kind(), ErrorKind::Internal);
        assert_eq!(Error::validation("name too short").kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(Error::not_found("Expense").to_string(), "Expense not found");
    }
}
