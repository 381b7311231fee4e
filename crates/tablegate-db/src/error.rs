use thiserror::Error;

use tablegate_core::Operation;
use tablegate_storage::StorageError;

/// Errors raised by the external database layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Operation {operation} not allowed for table {table}")]
    OperationNotAllowed { operation: Operation, table: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Delete requires at least one condition")]
    EmptyDeleteConditions,

    #[error("Insert payload must not be empty")]
    EmptyInsertPayload,

    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Metadata store error: {0}")]
    Store(String),

    #[error("External database error: {0}")]
    Upstream(String),
}

impl DbError {
    pub fn not_allowed(operation: Operation, table: impl Into<String>) -> Self {
        Self::OperationNotAllowed {
            operation,
            table: table.into(),
        }
    }

    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier(name.into())
    }

    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl(url.into())
    }

    pub fn credential(message: impl std::fmt::Display) -> Self {
        Self::Credential(message.to_string())
    }

    pub fn upstream(message: impl std::fmt::Display) -> Self {
        Self::Upstream(message.to_string())
    }

    /// Errors the caller caused: rejected before any SQL reaches the
    /// external database.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier(_)
                | Self::EmptyDeleteConditions
                | Self::EmptyInsertPayload
                | Self::InvalidUrl(_)
        )
    }

    pub fn is_not_allowed(&self) -> bool {
        matches!(self, Self::OperationNotAllowed { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<StorageError> for DbError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else {
            Self::Store(err.to_string())
        }
    }
}

/// Convenience result type for database operations
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_allowed_message() {
        let err = DbError::not_allowed(Operation::Put, "orders");
        assert_eq!(err.to_string(), "Operation PUT not allowed for table orders");
        assert!(err.is_not_allowed());
        assert!(!err.is_bad_request());
    }

    #[test]
    fn test_bad_request_classification() {
        assert!(DbError::EmptyDeleteConditions.is_bad_request());
        assert!(DbError::EmptyInsertPayload.is_bad_request());
        assert!(DbError::invalid_identifier("drop table").is_bad_request());
        assert!(!DbError::upstream("connection refused").is_bad_request());
    }
}
