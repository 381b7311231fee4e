//! HTTP-facing error type for the gateway routes.
//!
//! Maps the gateway error taxonomy onto statuses with a JSON `{error}`
//! body. Messages carry a single diagnostic string; driver internals and
//! stack traces never reach the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use tablegate_db::DbError;
use tablegate_graphql::GraphQLError;
use tablegate_storage::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::MethodNotAllowed(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = %status, error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_not_allowed() {
            Self::MethodNotAllowed(err.to_string())
        } else if err.is_bad_request() {
            Self::BadRequest(err.to_string())
        } else {
            match err {
                DbError::NotFound(message) => Self::NotFound(message),
                DbError::Upstream(message) => Self::Upstream(message),
                other => Self::Internal(other.to_string()),
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<GraphQLError> for ApiError {
    fn from(err: GraphQLError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<tablegate_auth::AuthError> for ApiError {
    fn from(err: tablegate_auth::AuthError) -> Self {
        use tablegate_auth::AuthError;
        match err {
            AuthError::Internal { .. } => Self::Internal(err.to_string()),
            _ => Self::BadRequest(err.to_string()),
        }
    }
}
