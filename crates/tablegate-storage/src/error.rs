use thiserror::Error;
use uuid::Uuid;

/// Errors raised by metadata store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{entity} already exists: {id}")]
    Conflict { entity: &'static str, id: Uuid },

    #[error("Storage error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn conflict(entity: &'static str, id: Uuid) -> Self {
        Self::Conflict { entity, id }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience result type for store operations
pub type Result<T> = std::result::Result<T, StorageError>;
