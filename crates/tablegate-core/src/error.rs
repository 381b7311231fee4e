use thiserror::Error;

/// Core error types for tablegate domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid API type: {0}")]
    InvalidApiType(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid driver identifier: {0}")]
    InvalidDriver(String),

    #[error("Invalid organization status: {0}")]
    InvalidStatus(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidApiType error
    pub fn invalid_api_type(api_type: impl Into<String>) -> Self {
        Self::InvalidApiType(api_type.into())
    }

    /// Create a new InvalidOperation error
    pub fn invalid_operation(op: impl Into<String>) -> Self {
        Self::InvalidOperation(op.into())
    }

    /// Create a new InvalidDriver error
    pub fn invalid_driver(driver: impl Into<String>) -> Self {
        Self::InvalidDriver(driver.into())
    }

    /// Create a new InvalidStatus error
    pub fn invalid_status(status: impl Into<String>) -> Self {
        Self::InvalidStatus(status.into())
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidApiType(_)
                | Self::InvalidOperation(_)
                | Self::InvalidDriver(_)
                | Self::InvalidStatus(_)
                | Self::JsonError(_)
        )
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CoreError::invalid_api_type("SOAP");
        assert_eq!(err.to_string(), "Invalid API type: SOAP");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_invalid_operation_message() {
        let err = CoreError::invalid_operation("PATCH");
        assert_eq!(err.to_string(), "Invalid operation: PATCH");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
        let core_err: CoreError = json_err.into();
        assert!(matches!(core_err, CoreError::JsonError(_)));
        assert!(core_err.is_client_error());
    }
}
