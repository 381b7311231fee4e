use thiserror::Error;

/// Errors raised by the GraphQL layer.
#[derive(Debug, Error)]
pub enum GraphQLError {
    #[error("Schema build failed: {0}")]
    SchemaBuildFailed(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}

impl GraphQLError {
    pub fn schema_build_failed(message: impl Into<String>) -> Self {
        Self::SchemaBuildFailed(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}
