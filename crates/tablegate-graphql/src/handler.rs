//! Axum HTTP handler for the GraphQL endpoint.
//!
//! `POST /graphql` executes a standard GraphQL request body against the
//! currently published schema. The gateway context rides along as request
//! data so field resolvers can reach the stores and connection hub.

use std::sync::Arc;

use async_graphql::{Request, Variables};
use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::debug;

use crate::context::GatewayContext;
use crate::schema::SharedSchema;

/// State shared across GraphQL handlers.
#[derive(Clone)]
pub struct GraphQLState {
    pub schema: Arc<SharedSchema>,
    pub context: Arc<GatewayContext>,
}

/// GraphQL request body.
#[derive(Debug, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL query string.
    pub query: String,

    /// Optional operation name for multi-operation documents.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables for the query.
    pub variables: Option<serde_json::Value>,
}

/// `POST /graphql` handler.
pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    Json(body): Json<GraphQLRequest>,
) -> Json<async_graphql::Response> {
    debug!(operation = ?body.operation_name, "Executing GraphQL request");

    let mut request = Request::new(body.query).data(Arc::clone(&state.context));
    if let Some(name) = body.operation_name {
        request = request.operation_name(name);
    }
    if let Some(variables) = body.variables {
        request = request.variables(Variables::from_json(variables));
    }

    let schema = state.schema.load();
    Json(schema.execute(request).await)
}
