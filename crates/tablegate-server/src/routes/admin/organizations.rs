//! Organization and client administration.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use tablegate_core::{Client, Organization, OrganizationStatus};
use tablegate_storage::OrganizationStore as _;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrganizationRequest {
    pub name: String,
    /// "Active", "Inactive" or "Suspended".
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "Active".to_string()
}

/// Read view of a client; the stored secret never leaves the service.
#[derive(Debug, Serialize)]
pub struct ClientView {
    pub id: Uuid,
    pub client_id: String,
    pub organization_id: Uuid,
}

impl From<Client> for ClientView {
    fn from(c: Client) -> Self {
        Self {
            id: c.id,
            client_id: c.client_id,
            organization_id: c.organization_id,
        }
    }
}

fn parse_status(raw: &str) -> Result<OrganizationStatus, ApiError> {
    raw.parse()
        .map_err(|e: tablegate_core::CoreError| ApiError::bad_request(e.to_string()))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Organization>>, ApiError> {
    Ok(Json(state.organizations.list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<OrganizationRequest>,
) -> Result<(StatusCode, Json<Organization>), ApiError> {
    let organization = Organization {
        id: Uuid::new_v4(),
        name: request.name,
        status: parse_status(&request.status)?,
    };

    let stored = state.organizations.create(organization).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<OrganizationRequest>,
) -> Result<Json<Organization>, ApiError> {
    let organization = Organization {
        id,
        name: request.name,
        status: parse_status(&request.status)?,
    };

    let stored = state.organizations.update(organization).await?;
    Ok(Json(stored))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.organizations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_clients(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ClientView>>, ApiError> {
    let clients = state.directory.list_by_organization(id).await?;
    Ok(Json(clients.into_iter().map(Into::into).collect()))
}

/// Creates a client with generated credentials. The raw secret appears in
/// this response exactly once and is stored only in encrypted form.
pub async fn create_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    state
        .organizations
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Organization {id} not found")))?;

    let (client, raw_secret) = state.directory.create_client(id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": client.id,
            "client_id": client.client_id,
            "client_secret": raw_secret,
            "organization_id": client.organization_id,
        })),
    ))
}

pub async fn remove_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
