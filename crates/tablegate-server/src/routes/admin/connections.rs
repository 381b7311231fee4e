//! Connection descriptor administration.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use tablegate_core::{DbConnectionDescriptor, DriverKind};
use tablegate_db::PasswordInput;

use crate::error::ApiError;
use crate::state::AppState;

/// Write payload for a connection descriptor. `password` absent means
/// "leave the stored password untouched"; present means "set this value".
#[derive(Debug, Deserialize)]
pub struct ConnectionRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub username: String,
    /// Driver identifier; inferred from the URL scheme when omitted.
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Read view of a descriptor. The stored password (even encrypted) never
/// leaves the service.
#[derive(Debug, Serialize)]
pub struct ConnectionView {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub username: String,
    pub driver: DriverKind,
}

impl From<DbConnectionDescriptor> for ConnectionView {
    fn from(d: DbConnectionDescriptor) -> Self {
        Self {
            id: d.id,
            name: d.name,
            url: d.url,
            username: d.username,
            driver: d.driver,
        }
    }
}

fn parse_driver(request: &ConnectionRequest) -> Result<DriverKind, ApiError> {
    match &request.driver {
        Some(raw) => raw
            .parse()
            .map_err(|e: tablegate_core::CoreError| ApiError::bad_request(e.to_string())),
        None => DriverKind::from_url(&request.url)
            .map_err(|e| ApiError::bad_request(e.to_string())),
    }
}

fn password_input(request: &ConnectionRequest) -> PasswordInput {
    match &request.password {
        Some(raw) => PasswordInput::Set(raw.clone()),
        None => PasswordInput::Unchanged,
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ConnectionView>>, ApiError> {
    let connections = state.registry.list().await?;
    Ok(Json(connections.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<ConnectionRequest>,
) -> Result<(StatusCode, Json<ConnectionView>), ApiError> {
    let driver = parse_driver(&request)?;
    let password = password_input(&request);

    let descriptor = DbConnectionDescriptor {
        id: Uuid::new_v4(),
        name: request.name,
        url: request.url,
        username: request.username,
        password: String::new(),
        driver,
    };

    let stored = state.registry.create(descriptor, password).await?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ConnectionRequest>,
) -> Result<Json<ConnectionView>, ApiError> {
    state
        .registry
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Connection {id} not found")))?;

    let driver = parse_driver(&request)?;
    let password = password_input(&request);

    let descriptor = DbConnectionDescriptor {
        id,
        name: request.name,
        url: request.url,
        username: request.username,
        password: String::new(),
        driver,
    };

    let stored = state.registry.update(descriptor, password).await?;
    Ok(Json(stored.into()))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete(id).await?;

    // The cascade may have removed GraphQL definitions.
    if let Err(e) = state.schema.refresh().await {
        error!(error = %e, "Schema refresh failed; previous schema remains active");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn test(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let descriptor = state
        .registry
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Connection {id} not found")))?;

    let success = state.registry.test_connection(&descriptor).await;
    Ok(Json(json!({ "success": success })))
}

pub async fn tables(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<String>>, ApiError> {
    let descriptor = state
        .registry
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Connection {id} not found")))?;

    Ok(Json(state.introspector.list_tables(&descriptor).await))
}

pub async fn columns(
    State(state): State<AppState>,
    Path((id, table)): Path<(Uuid, String)>,
) -> Result<Json<Vec<String>>, ApiError> {
    let descriptor = state
        .registry
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Connection {id} not found")))?;

    Ok(Json(state.introspector.list_columns(&descriptor, &table).await))
}
