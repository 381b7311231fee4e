//! Dynamic REST endpoint dispatcher.
//!
//! Routes `/api/dynamic/{table}` verbs to the query executor after
//! resolving the first matching REST definition for the table. Bearer-token
//! verification for these routes is assumed to have happened upstream.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Map, Value, json};
use tracing::debug;

use tablegate_core::{ApiDefinition, ApiType, DbConnectionDescriptor};
use tablegate_storage::{ApiDefinitionStore as _, ConnectionStore as _};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/dynamic/{table}`: full read of the table's exposed columns.
pub async fn get_table(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
) -> Result<Json<Vec<Map<String, Value>>>, ApiError> {
    let definition = resolve_definition(&state, &table_name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No REST API defined for {table_name}")))?;

    let source = resolve_source(&state, &definition).await?;
    let rows = state.executor.select_rows(&source, &definition).await?;

    debug!(table = %table_name, rows = rows.len(), "Dynamic read served");
    Ok(Json(rows))
}

/// `PUT /api/dynamic/{table}`: insert one row from a flat JSON object.
pub async fn put_table(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    // An undefined table reports method-not-allowed on writes, matching
    // the REST surface contract.
    let definition = resolve_definition(&state, &table_name).await?.ok_or_else(|| {
        ApiError::method_not_allowed(format!("No REST API defined for {table_name}"))
    })?;

    let source = resolve_source(&state, &definition).await?;
    let rows_affected = state
        .executor
        .insert_row(&source, &definition, &payload)
        .await?;

    debug!(table = %table_name, rows_affected, "Dynamic insert served");
    Ok(Json(json!({ "rowsAffected": rows_affected })))
}

/// `DELETE /api/dynamic/{table}?col=val&...`: delete by equality conditions.
pub async fn delete_table(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    Query(conditions): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let definition = resolve_definition(&state, &table_name).await?.ok_or_else(|| {
        ApiError::method_not_allowed(format!("No REST API defined for {table_name}"))
    })?;

    let source = resolve_source(&state, &definition).await?;
    let rows_affected = state
        .executor
        .delete_rows(&source, &definition, &conditions)
        .await?;

    debug!(table = %table_name, rows_affected, "Dynamic delete served");
    Ok(Json(json!({ "rowsAffected": rows_affected })))
}

async fn resolve_definition(
    state: &AppState,
    table_name: &str,
) -> Result<Option<ApiDefinition>, ApiError> {
    Ok(state
        .definitions
        .find_by_table(table_name, ApiType::Rest)
        .await?)
}

async fn resolve_source(
    state: &AppState,
    definition: &ApiDefinition,
) -> Result<tablegate_db::DataSource, ApiError> {
    let descriptor = connection_of(state, definition).await?;
    Ok(state.hub.resolve(&descriptor).await?)
}

async fn connection_of(
    state: &AppState,
    definition: &ApiDefinition,
) -> Result<DbConnectionDescriptor, ApiError> {
    state
        .connections
        .get(definition.connection_id)
        .await?
        .ok_or_else(|| {
            ApiError::internal(format!(
                "Connection {} referenced by definition {} is gone",
                definition.connection_id, definition.id
            ))
        })
}
