use thiserror::Error;

/// Errors raised while authenticating clients or issuing tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Grant type '{grant_type}' is not supported")]
    UnsupportedGrantType { grant_type: String },

    #[error("Invalid client: {message}")]
    InvalidClient { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AuthError {
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// OAuth2 error code for the wire.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::InvalidClient { .. } => "invalid_client",
            Self::Internal { .. } => "server_error",
        }
    }

    /// HTTP status the token endpoint reports for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::UnsupportedGrantType { .. } => 400,
            Self::InvalidClient { .. } => 401,
            Self::Internal { .. } => 500,
        }
    }
}

impl From<tablegate_storage::StorageError> for AuthError {
    fn from(err: tablegate_storage::StorageError) -> Self {
        Self::internal(err.to_string())
    }
}
