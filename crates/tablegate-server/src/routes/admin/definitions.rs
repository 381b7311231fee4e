//! API definition administration.
//!
//! Every successful mutation triggers a schema rebuild so the GraphQL
//! artifact never goes stale relative to the definition store. A failed
//! rebuild is logged and the previous schema stays active.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use tablegate_core::{ApiDefinition, ApiType, OperationSet};
use tablegate_storage::{ApiDefinitionStore as _, ConnectionStore as _};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DefinitionRequest {
    pub table_name: String,
    /// "REST" or "GraphQL".
    pub api_type: String,
    /// Comma-encoded, e.g. "GET,DELETE".
    pub allowed_operations: String,
    /// Explicit column allow-list; empty means all columns.
    #[serde(default)]
    pub included_columns: Vec<String>,
    pub connection_id: Uuid,
}

impl DefinitionRequest {
    fn into_definition(self, id: Uuid) -> Result<ApiDefinition, ApiError> {
        let api_type: ApiType = self
            .api_type
            .parse()
            .map_err(|e: tablegate_core::CoreError| ApiError::bad_request(e.to_string()))?;
        let allowed_operations: OperationSet = self
            .allowed_operations
            .parse()
            .map_err(|e: tablegate_core::CoreError| ApiError::bad_request(e.to_string()))?;

        Ok(ApiDefinition {
            id,
            table_name: self.table_name,
            api_type,
            allowed_operations,
            included_columns: self.included_columns,
            connection_id: self.connection_id,
        })
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ApiDefinition>>, ApiError> {
    Ok(Json(state.definitions.list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<DefinitionRequest>,
) -> Result<(StatusCode, Json<ApiDefinition>), ApiError> {
    ensure_connection_exists(&state, request.connection_id).await?;

    let definition = request.into_definition(Uuid::new_v4())?;
    let stored = state.definitions.create(definition).await?;

    refresh_schema(&state).await;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DefinitionRequest>,
) -> Result<Json<ApiDefinition>, ApiError> {
    state
        .definitions
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("API definition {id} not found")))?;
    ensure_connection_exists(&state, request.connection_id).await?;

    let definition = request.into_definition(id)?;
    let stored = state.definitions.update(definition).await?;

    refresh_schema(&state).await;
    Ok(Json(stored))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.definitions.delete(id).await?;

    refresh_schema(&state).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_connection_exists(state: &AppState, connection_id: Uuid) -> Result<(), ApiError> {
    state
        .connections
        .get(connection_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::bad_request(format!("Unknown connection: {connection_id}")))
}

async fn refresh_schema(state: &AppState) {
    if let Err(e) = state.schema.refresh().await {
        error!(error = %e, "Schema refresh failed; previous schema remains active");
    }
}
